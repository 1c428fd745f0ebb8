//! Intent dispatch.
//!
//! One intent moves through: rate check, caller resolution, handler
//! selection, invocation inside a failure boundary, then output flush.
//! Commands and shorthands invoke at most one module; plain events fan out
//! to every subscriber.

use super::context::{Context, Services};
use super::middleware::ResponseMiddleware;
use super::output::{LineKind, OutputBatcher, OutputBuffer};
use super::registry::ModuleDescriptor;
use crate::error::ModuleError;
use crate::intent::{Intent, IntentKind};
use crate::security::{Caller, PermissionGate, RateLimiter};
use futures_util::FutureExt;
use futures_util::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, warn};

/// Reply sent when an advertised command refuses the caller.
pub const PERMISSION_DENIED: &str = "permission denied";

/// What happened to one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    RateLimited,
    NoHandler,
    Denied,
    Handled,
    HandlerFailed,
    /// Fan-out finished; the count is subscribers that ran without failing.
    Observed(usize),
}

pub struct Dispatcher {
    services: Services,
    limiter: Arc<RateLimiter>,
    gate: PermissionGate,
    batcher: OutputBatcher,
    sink: ResponseMiddleware,
}

impl Dispatcher {
    pub fn new(
        services: Services,
        limiter: Arc<RateLimiter>,
        gate: PermissionGate,
        batcher: OutputBatcher,
        sink: ResponseMiddleware,
    ) -> Self {
        Self {
            services,
            limiter,
            gate,
            batcher,
            sink,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Route one classified intent to its handlers and flush their output.
    pub async fn dispatch(&self, intent: &Intent) -> DispatchOutcome {
        let span = tracing::debug_span!(
            "bot.dispatch",
            kind = intent.kind.label(),
            nick = %intent.nick,
            channel = %intent.channel,
        );
        self.dispatch_inner(intent).instrument(span).await
    }

    async fn dispatch_inner(&self, intent: &Intent) -> DispatchOutcome {
        if intent.kind.is_addressed() {
            let verdict = self.limiter.check(&intent.hostmask);
            if !verdict.is_admitted() {
                debug!(hostmask = %intent.hostmask, ?verdict, "rate limited");
                crate::metrics::record_rate_limited();
                return DispatchOutcome::RateLimited;
            }
        } else if self.limiter.is_banned(&intent.hostmask) {
            debug!(hostmask = %intent.hostmask, "event from banned identity dropped");
            return DispatchOutcome::RateLimited;
        }

        // Events skip permission checks, so only addressed intents pay for the lookup.
        let caller = if intent.kind.is_addressed() {
            self.gate.resolve(intent).await
        } else {
            Caller::default()
        };
        let registry = &self.services.registry;

        match &intent.kind {
            IntentKind::Command { name, .. } => {
                let candidates = registry.find_command_handlers(name);
                let outcome = self.run_first_permitted(intent, &caller, candidates, true).await;
                if matches!(outcome, DispatchOutcome::Handled | DispatchOutcome::HandlerFailed) {
                    crate::metrics::record_command(name);
                }
                outcome
            }
            IntentKind::PlainEvent { signal } => self.fan_out(intent, &caller, signal).await,
            kind => {
                let Some(route) = kind.shorthand() else {
                    return DispatchOutcome::NoHandler;
                };
                let token = claimed_token(kind);
                if registry.is_command(&token) {
                    debug!(token = %token, "shorthand token now claimed by a command");
                    return DispatchOutcome::NoHandler;
                }
                let candidates = registry.find_shorthand_handlers(route);
                self.run_first_permitted(intent, &caller, candidates, false).await
            }
        }
    }

    /// Invoke the first candidate the caller may use. A refusal is reported
    /// in chat only for advertised commands.
    async fn run_first_permitted(
        &self,
        intent: &Intent,
        caller: &Caller,
        candidates: Vec<Arc<ModuleDescriptor>>,
        explicit_denial: bool,
    ) -> DispatchOutcome {
        if candidates.is_empty() {
            return DispatchOutcome::NoHandler;
        }

        let chosen = candidates
            .iter()
            .find(|m| self.gate.permits(caller, intent, &m.required_permissions));

        let Some(module) = chosen else {
            crate::metrics::record_permission_denied();
            debug!(nick = %intent.nick, "permission denied");
            if explicit_denial && candidates.iter().any(|m| !m.hidden) {
                let mut out = OutputBuffer::new();
                out.push(LineKind::Reply, PERMISSION_DENIED);
                self.flush(&mut out, intent).await;
            }
            return DispatchOutcome::Denied;
        };

        match self.invoke(module, intent, caller).await {
            Ok((_, mut out)) => {
                self.flush(&mut out, intent).await;
                DispatchOutcome::Handled
            }
            Err(e) => {
                report_failure(module, intent, &e);
                DispatchOutcome::HandlerFailed
            }
        }
    }

    /// Run every subscriber concurrently, then flush in registration order.
    async fn fan_out(&self, intent: &Intent, caller: &Caller, signal: &str) -> DispatchOutcome {
        let subscribers = self.services.registry.find_event_handlers(signal);
        if subscribers.is_empty() {
            return DispatchOutcome::NoHandler;
        }
        crate::metrics::record_event(signal);

        let results = join_all(
            subscribers
                .iter()
                .map(|module| self.invoke(module, intent, caller)),
        )
        .await;

        let mut completed = 0;
        for (module, result) in subscribers.iter().zip(results) {
            match result {
                Ok((_, mut out)) => {
                    completed += 1;
                    self.flush(&mut out, intent).await;
                }
                Err(e) => report_failure(module, intent, &e),
            }
        }
        DispatchOutcome::Observed(completed)
    }

    /// Run one module with its own buffer. Panics become `ModuleError::Panicked`.
    async fn invoke(
        &self,
        module: &ModuleDescriptor,
        intent: &Intent,
        caller: &Caller,
    ) -> Result<(Option<bool>, OutputBuffer), ModuleError> {
        let mut out = OutputBuffer::new();
        let result = {
            let mut ctx = Context::new(&self.services, caller, &mut out);
            AssertUnwindSafe(module.handler.run(&mut ctx, intent))
                .catch_unwind()
                .await
        };

        match result {
            Ok(Ok(handled)) => Ok((handled, out)),
            Ok(Err(e)) => Err(e),
            Err(payload) => Err(ModuleError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    async fn flush(&self, out: &mut OutputBuffer, intent: &Intent) {
        let lines = self.batcher.flush(out, intent);
        if lines.is_empty() {
            return;
        }
        if let Err(e) = self.sink.send_all(lines).await {
            warn!(error = %e, target = %intent.reply_target(), "failed to deliver output");
        }
    }
}

/// The token a real command would have to own to take over a shorthand.
fn claimed_token(kind: &IntentKind) -> String {
    match kind {
        IntentKind::Karma { key, direction, .. } => {
            let op = match direction {
                crate::intent::Direction::Up => "++",
                crate::intent::Direction::Down => "--",
            };
            format!("{}{op}", key.to_ascii_lowercase())
        }
        IntentKind::ShorthandSet { key, .. } | IntentKind::ShorthandGet { key } => {
            key.to_ascii_lowercase()
        }
        _ => String::new(),
    }
}

fn report_failure(module: &ModuleDescriptor, intent: &Intent, e: &ModuleError) {
    error!(
        module = %module.name,
        nick = %intent.nick,
        channel = %intent.channel,
        text = %intent.raw_text,
        error = %e,
        "handler failed; output discarded"
    );
    crate::metrics::record_handler_failure(&module.name, e.error_code());
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
