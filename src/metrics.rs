//! Prometheus metrics collection for slircbot.
//!
//! Exposed on an HTTP endpoint when `metrics_port` is configured. Every
//! `record_*` helper is a no-op until [`init`] has run, so library users and
//! tests that never call it pay nothing.
//!
//! - `bot_commands_total{command}` - Commands handled by name
//! - `bot_events_total{signal}` - Events fanned out by signal
//! - `bot_handler_failures_total{module,error}` - Handler errors and panics

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Lines handed to the outbound queue.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Addressed input rejected by the rate gate.
pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();

/// Intents no candidate module would accept from the caller.
pub static PERMISSION_DENIED: OnceLock<IntCounter> = OnceLock::new();

/// Flushes redirected to private messages.
pub static OUTPUT_OVERFLOWS: OnceLock<IntCounter> = OnceLock::new();

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

pub static EVENT_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

pub static HANDLER_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before serving `/metrics`.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(MESSAGES_SENT, IntCounter::new("bot_messages_sent_total", "Lines queued for the server"));
    register!(RATE_LIMITED, IntCounter::new("bot_rate_limited_total", "Addressed input rejected by the rate gate"));
    register!(PERMISSION_DENIED, IntCounter::new("bot_permission_denied_total", "Intents refused by the permission gate"));
    register!(OUTPUT_OVERFLOWS, IntCounter::new("bot_output_overflows_total", "Output flushes redirected privately"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("bot_commands_total", "Commands handled by name"), &["command"]));
    register!(EVENT_COUNTER, IntCounterVec::new(Opts::new("bot_events_total", "Events fanned out by signal"), &["signal"]));
    register!(HANDLER_FAILURES, IntCounterVec::new(Opts::new("bot_handler_failures_total", "Handler errors and panics"), &["module", "error"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
fn inc(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

#[inline]
fn inc_labeled(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
pub fn record_message_sent() {
    inc(&MESSAGES_SENT);
}

#[inline]
pub fn record_rate_limited() {
    inc(&RATE_LIMITED);
}

#[inline]
pub fn record_permission_denied() {
    inc(&PERMISSION_DENIED);
}

#[inline]
pub fn record_output_overflow() {
    inc(&OUTPUT_OVERFLOWS);
}

/// Record a handled command.
#[inline]
pub fn record_command(command: &str) {
    inc_labeled(&COMMAND_COUNTER, &[command]);
}

#[inline]
pub fn record_event(signal: &str) {
    inc_labeled(&EVENT_COUNTER, &[signal]);
}

/// Record a handler error or panic.
#[inline]
pub fn record_handler_failure(module: &str, error: &str) {
    inc_labeled(&HANDLER_FAILURES, &[module, error]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_command("karma");
        record_handler_failure("seen", "panic");

        let output = gather_metrics();
        assert!(output.contains("bot_commands_total"));
        assert!(output.contains("module=\"seen\""));
    }
}
