//! The bot: classification plus dispatch over one ordered event stream.

use crate::classifier::Classifier;
use crate::config::Config;
use crate::db::Database;
use crate::error::ClassificationError;
use crate::handlers::core::{DispatchOutcome, Dispatcher, OutputBatcher, ResponseMiddleware, Services};
use crate::handlers::Registry;
use crate::intent::Event;
use crate::security::{PermissionGate, RateLimiter};
use crate::state::Roster;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct Bot {
    classifier: Classifier,
    dispatcher: Dispatcher,
}

impl Bot {
    /// Build a bot over an already populated registry.
    ///
    /// Fails only if the configured trigger cannot be compiled.
    pub fn new(
        config: &Config,
        db: Database,
        registry: Arc<Registry>,
        sink: ResponseMiddleware,
    ) -> Result<Self, ClassificationError> {
        let classifier = Classifier::new(&config.bot.trigger)?;
        let bot_nick = Arc::new(RwLock::new(config.bot.nick.clone()));

        let gate = PermissionGate::new(
            Arc::clone(&bot_nick),
            config.bot.owner_command.to_ascii_lowercase(),
            Arc::new(db.clone()),
        );
        let services = Services {
            db,
            registry,
            roster: Arc::new(Roster::new()),
            bot_nick,
            trigger: config.bot.trigger.clone(),
        };
        let dispatcher = Dispatcher::new(
            services,
            Arc::new(RateLimiter::new(config.rate_limits.clone())),
            gate,
            OutputBatcher::new(
                config.output.max_output_lines,
                config.output.overflow_warning.clone(),
            ),
            sink,
        );

        Ok(Self {
            classifier,
            dispatcher,
        })
    }

    /// The nick cell shared with the connection, which updates it on 001/433.
    pub fn nick_handle(&self) -> Arc<RwLock<String>> {
        Arc::clone(&self.dispatcher.services().bot_nick)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.dispatcher.services().registry
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.dispatcher.services().roster
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.dispatcher.limiter()
    }

    /// Classify and dispatch one event, after updating channel membership.
    pub async fn handle_event(&self, event: &Event) -> DispatchOutcome {
        let services = self.dispatcher.services();
        services.roster.observe(event);

        let registry = &services.registry;
        let intent = self
            .classifier
            .classify(event, |name| registry.is_command(name));

        let outcome = self.dispatcher.dispatch(&intent).await;
        debug!(kind = intent.kind.label(), ?outcome, "dispatched");
        outcome
    }

    /// Process events in arrival order until the sender side closes.
    pub async fn run(&self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle_event(&event).await;
        }
        info!("event stream closed");
    }

    /// Periodically drop rate-limit state for identities that went quiet.
    pub fn spawn_maintenance(&self, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self.dispatcher.limiter());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.cleanup();
                let stats = limiter.stats();
                debug!(
                    removed,
                    tracked = stats.tracked_identities,
                    banned = stats.banned_identities,
                    "rate limiter cleanup"
                );
            }
        })
    }
}
