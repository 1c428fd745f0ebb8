//! `headlines`: recent items from a configured feed.
//!
//! The feed is fetched by a background refresher into a [`SharedCache`];
//! the command only reads the latest snapshot and never waits on the network.

use crate::error::{ModuleError, ModuleResult};
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::Intent;
use crate::state::{SharedCache, Source};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Headlines {
    cache: Arc<SharedCache<Vec<String>>>,
    max_items: usize,
}

impl Headlines {
    pub fn new(cache: Arc<SharedCache<Vec<String>>>, max_items: usize) -> Self {
        Self { cache, max_items }
    }
}

#[async_trait]
impl Module for Headlines {
    fn name(&self) -> &'static str {
        "headlines"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command("headlines")
            .permission("user")
            .help("headlines: the latest items from the news feed.")
    }

    async fn run(&self, ctx: &mut Context<'_>, _intent: &Intent) -> ModuleResult {
        let items = self.cache.snapshot();
        if items.is_empty() {
            ctx.reply("No headlines yet.");
            return Ok(None);
        }
        for item in items.iter().take(self.max_items) {
            ctx.say(item);
        }
        Ok(None)
    }
}

/// Fetches an RSS or Atom feed and extracts item titles.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    title: Regex,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, ModuleError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("slircbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let title = title_pattern().map_err(|e| ModuleError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            title,
        })
    }
}

#[async_trait]
impl Source<Vec<String>> for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<String>, ModuleError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(extract_titles(&self.title, &body))
    }
}

fn title_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r"(?s)<title[^>]*>\s*(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?\s*</title>")
}

/// Item titles in feed order, skipping the feed's own title.
fn extract_titles(pattern: &Regex, body: &str) -> Vec<String> {
    pattern
        .captures_iter(body)
        .skip(1)
        .filter_map(|c| c.get(1))
        .map(|m| unescape(m.as_str().trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
