//! Server connection adapter.
//!
//! Runs an `irc` client session, turns its messages into
//! [`Event`](crate::intent::Event)s and sends queued
//! [`Outbound`](crate::handlers::Outbound) lines as paced PRIVMSGs.

pub mod adapter;
mod connection;

pub use connection::Connection;
