//! State management module.
//!
//! Contains the channel roster and shared caches fed by background tasks.

mod cache;
mod roster;

pub use cache::{SharedCache, Source, spawn_refresh};
pub use roster::Roster;
