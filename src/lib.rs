//! # planning-poker
//!
//! Real-time planning poker server. Clients connect over WebSocket to a
//! named room, vote on a card, and see every other vote in that room as it
//! changes.
//!
//! Rooms are created on first join and live in memory only. A background
//! sweep deletes rooms that have been idle for longer than their TTL. A
//! small REST surface exposes health, the voting card catalog, and room
//! inspection and deletion.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler + CommandDispatcher (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── RoomRegistry (domain/)
//!     │       └── Room ── SessionTransport ──► clients
//!     │
//!     └── Expiry sweeper (service/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
