//! Service layer: background maintenance of the room registry.
//!
//! The expiry sweep is the only long-lived task that is not tied to a
//! client connection.

pub mod sweeper;

pub use sweeper::{run_sweeper, spawn_sweeper};
