//! Domain layer: room identity, the room aggregate, its registry, and the
//! transport seam it broadcasts through.
//!
//! Nothing in here knows about axum or WebSockets. Clients are reached
//! through [`SessionTransport`], and outbound frames are [`ServerMessage`]s.

pub mod fanout;
pub mod room;
pub mod room_id;
pub mod room_registry;
pub mod server_message;
pub mod session_id;
pub mod settings;
pub mod transport;

pub use fanout::DeliveryReport;
pub use room::{Room, RoomSummary};
pub use room_id::RoomId;
pub use room_registry::{RoomHandle, RoomRegistry};
pub use server_message::{ServerMessage, VoteLedger};
pub use session_id::SessionId;
pub use settings::RoomSettings;
pub use transport::{CloseReason, SessionTransport, TransportError};
