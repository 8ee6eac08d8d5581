//! WebSocket layer: connection handling and message dispatch.
//!
//! The endpoint at `/ws/{room_id}` carries the whole room protocol. The
//! first frame joins the room; later frames are votes, settings changes,
//! and room commands.

pub mod connection;
pub mod dispatcher;
pub mod handler;
pub mod messages;

pub use dispatcher::{CommandDispatcher, Flow};
pub use messages::{InboundMessage, JoinRequest, RoomCommand};
