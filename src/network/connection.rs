//! Connection - the bot's single client session with an IRC server.
//!
//! ```text
//!  irc::Client stream ──▶ adapter::to_event ──▶ Event ──▶ events tx
//!          │
//!   001 nick sync, ERROR handled here; PING, autojoin and 433 by the client
//!
//!  outbound rx ──▶ governor pacing ──▶ adapter::clip ──▶ send_privmsg
//! ```
//!
//! The client stream and paced writes share one `tokio::select!` loop, so
//! the outbound queue outlives a dropped session and [`Connection::run`] can
//! be called again to reconnect.

use super::adapter::{clip, to_event};
use crate::config::{BotConfig, Config, NetworkConfig, ServerConfig};
use crate::error::ConnectionError;
use crate::handlers::Outbound;
use crate::intent::Event;
use futures_util::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use irc::client::prelude::{Client, Command, Config as ClientConfig, Message, Response};
use nonzero_ext::nonzero;
use parking_lot::RwLock;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

pub struct Connection {
    bot: BotConfig,
    server: ServerConfig,
    pacer: DefaultDirectRateLimiter,
    /// Shared with the permission gate; updated on 001.
    nick: Arc<RwLock<String>>,
}

impl Connection {
    pub fn new(config: &Config, nick: Arc<RwLock<String>>) -> Self {
        Self {
            bot: config.bot.clone(),
            server: config.server.clone(),
            pacer: pacer(&config.network),
            nick,
        }
    }

    /// Session settings for the client. Two underscore-suffixed nicks are
    /// tried when the configured one is taken.
    fn client_config(&self) -> ClientConfig {
        let nick = self.bot.nick.clone();
        ClientConfig {
            alt_nicks: vec![format!("{nick}_"), format!("{nick}__")],
            nickname: Some(nick),
            username: Some(self.bot.username().to_string()),
            realname: Some(self.bot.realname.clone()),
            server: Some(self.server.host.clone()),
            port: Some(self.server.port),
            password: self.server.password.clone(),
            use_tls: Some(self.server.use_tls),
            channels: self.server.channels.clone(),
            ..ClientConfig::default()
        }
    }

    /// Connect, register and relay until the server goes away.
    ///
    /// Always ends with an error; [`ConnectionError::Closed`] when the server
    /// closed the stream or the bot stopped consuming events.
    #[instrument(skip_all, fields(host = %self.server.host, port = self.server.port))]
    pub async fn run(
        &self,
        events: &mpsc::Sender<Event>,
        outbound: &mut mpsc::Receiver<Outbound>,
    ) -> Result<(), ConnectionError> {
        let mut client = Client::from_config(self.client_config()).await?;
        client.identify()?;
        let mut stream = client.stream()?;
        info!("connected");

        loop {
            tokio::select! {
                message = stream.next() => {
                    let Some(message) = message else {
                        return Err(ConnectionError::Closed);
                    };
                    if !self.handle_message(&client, &message?, events).await? {
                        return Err(ConnectionError::Closed);
                    }
                }
                Some(out) = outbound.recv() => {
                    self.pacer.until_ready().await;
                    client.send_privmsg(&out.target, clip(&out.text))?;
                }
            }
        }
    }

    /// Handle one inbound message. Returns `false` once the event consumer is gone.
    async fn handle_message(
        &self,
        client: &Client,
        message: &Message,
        events: &mpsc::Sender<Event>,
    ) -> Result<bool, ConnectionError> {
        match &message.command {
            Command::Response(Response::RPL_WELCOME, _) => {
                *self.nick.write() = client.current_nickname().to_string();
                info!(nick = %self.nick.read(), "registered");
            }
            Command::Response(Response::ERR_NICKNAMEINUSE, _) => {
                warn!(nick = %client.current_nickname(), "nickname in use, retrying");
            }
            Command::ERROR(reason) => {
                return Err(ConnectionError::ServerError(reason.clone()));
            }
            _ => {
                if let Some(event) = to_event(message)
                    && events.send(event).await.is_err()
                {
                    debug!("event consumer gone");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

fn pacer(network: &NetworkConfig) -> DefaultDirectRateLimiter {
    let rate = NonZeroU32::new(network.send_rate_per_second).unwrap_or(nonzero!(2u32));
    let burst = NonZeroU32::new(network.send_burst).unwrap_or(nonzero!(5u32));
    RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))
}
