//! Handler context passed to every module invocation.

use super::output::{LineKind, OutputBuffer};
use super::registry::Registry;
use crate::db::Database;
use crate::security::Caller;
use crate::state::Roster;
use parking_lot::RwLock;
use std::sync::Arc;

/// Long-lived collaborators shared by all dispatches.
#[derive(Clone)]
pub struct Services {
    pub db: Database,
    pub registry: Arc<Registry>,
    pub roster: Arc<Roster>,
    /// Current nick; changes if the configured one was taken.
    pub bot_nick: Arc<RwLock<String>>,
    pub trigger: String,
}

impl Services {
    pub fn bot_nick(&self) -> String {
        self.bot_nick.read().clone()
    }
}

/// Per-invocation context.
///
/// The output buffer belongs to this one invocation; it is flushed by the
/// dispatcher once `run` returns.
pub struct Context<'a> {
    pub services: &'a Services,
    pub caller: &'a Caller,
    out: &'a mut OutputBuffer,
}

impl<'a> Context<'a> {
    pub fn new(services: &'a Services, caller: &'a Caller, out: &'a mut OutputBuffer) -> Self {
        Self {
            services,
            caller,
            out,
        }
    }

    /// Say `text` in the channel.
    pub fn say(&mut self, text: impl AsRef<str>) {
        self.out.push(LineKind::Say, text.as_ref());
    }

    /// Say `text` in the channel, addressed to the requester.
    pub fn reply(&mut self, text: impl AsRef<str>) {
        self.out.push(LineKind::Reply, text.as_ref());
    }

    /// Send `text` privately to the requester.
    pub fn private(&mut self, text: impl AsRef<str>) {
        self.out.push(LineKind::Private, text.as_ref());
    }

    pub fn db(&self) -> &Database {
        &self.services.db
    }

    pub fn trigger(&self) -> &str {
        &self.services.trigger
    }

    pub fn buffered(&self) -> usize {
        self.out.len()
    }
}
