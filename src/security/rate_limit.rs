//! Rate limiting for command flood protection.
//!
//! Sliding windows over admitted attempts:
//! - per identity, 10 seconds and 60 seconds (the latter bans on overflow)
//! - system wide, 1 second
//!
//! # Architecture
//!
//! All state sits behind one mutex so a check and the update it implies are
//! atomic across the per-identity and global windows. Bans expire lazily on
//! the next check; `cleanup` drops identities that have gone quiet.

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

const SHORT_WINDOW: Duration = Duration::from_secs(10);
const LONG_WINDOW: Duration = Duration::from_secs(60);
const GLOBAL_WINDOW: Duration = Duration::from_secs(1);

/// Stand-in ban length when the configured one does not fit in an `Instant`.
const MAX_BAN: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Outcome of one rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateVerdict {
    Admitted,
    /// Identity is serving a ban.
    Banned,
    /// Too many attempts in the 10 second window.
    ShortWindow,
    /// Too many attempts in the 60 second window; a ban was set.
    LongWindow,
    /// The whole bot is over its per-second budget.
    Global,
}

impl RateVerdict {
    pub fn is_admitted(self) -> bool {
        self == Self::Admitted
    }
}

/// Per-identity sliding counters.
#[derive(Debug, Default)]
struct RateState {
    recent: VecDeque<Instant>,
    banned_until: Option<Instant>,
}

impl RateState {
    /// Drop timestamps older than the longest tracked window.
    fn prune(&mut self, now: Instant) {
        prune_older_than(&mut self.recent, now, LONG_WINDOW);
    }

    /// Clear a ban that has run out. Returns whether a ban is still active.
    fn ban_active(&mut self, now: Instant) -> bool {
        match self.banned_until {
            Some(until) if until > now => true,
            Some(_) => {
                self.banned_until = None;
                false
            }
            None => false,
        }
    }

    fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.recent
            .iter()
            .rev()
            .take_while(|&&t| now.saturating_duration_since(t) < window)
            .count()
    }
}

fn ban_end(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration)
        .or_else(|| now.checked_add(MAX_BAN))
        .unwrap_or(now)
}

fn prune_older_than(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&t) = queue.front() {
        if now.saturating_duration_since(t) >= window {
            queue.pop_front();
        } else {
            break;
        }
    }
}

#[derive(Debug, Default)]
struct Windows {
    identities: HashMap<String, RateState>,
    global: VecDeque<Instant>,
}

/// Thread-safe command rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(Windows::default()),
            config,
        }
    }

    /// Check and, if admitted, record one attempt by `identity`.
    pub fn check(&self, identity: &str) -> RateVerdict {
        self.check_at(identity, Instant::now())
    }

    pub fn check_at(&self, identity: &str, now: Instant) -> RateVerdict {
        let mut windows = self.windows.lock();
        let Windows { identities, global } = &mut *windows;
        let state = identities.entry(identity.to_string()).or_default();

        if state.ban_active(now) {
            debug!(identity = %identity, "attempt from banned identity");
            return RateVerdict::Banned;
        }

        state.prune(now);
        if state.count_within(now, SHORT_WINDOW) >= self.config.max_per_10s {
            debug!(identity = %identity, "10 second command limit exceeded");
            return RateVerdict::ShortWindow;
        }
        if state.count_within(now, LONG_WINDOW) >= self.config.max_per_minute {
            state.banned_until = Some(ban_end(now, self.config.ban_duration()));
            debug!(
                identity = %identity,
                ban_secs = self.config.ban_duration_secs,
                "minute command limit exceeded, identity banned"
            );
            return RateVerdict::LongWindow;
        }

        prune_older_than(global, now, GLOBAL_WINDOW);
        if global.len() >= self.config.max_global_per_second {
            debug!(identity = %identity, "global command limit exceeded");
            return RateVerdict::Global;
        }

        state.recent.push_back(now);
        global.push_back(now);
        RateVerdict::Admitted
    }

    /// Whether `identity` is serving a ban. Clears an expired ban.
    pub fn is_banned(&self, identity: &str) -> bool {
        self.is_banned_at(identity, Instant::now())
    }

    pub fn is_banned_at(&self, identity: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        windows
            .identities
            .get_mut(identity)
            .is_some_and(|state| state.ban_active(now))
    }

    /// Ban `identity` until `until`, regardless of its windows.
    pub fn ban_until(&self, identity: &str, until: Instant) {
        let mut windows = self.windows.lock();
        windows
            .identities
            .entry(identity.to_string())
            .or_default()
            .banned_until = Some(until);
    }

    /// Remove identities with no recent attempts and no active ban.
    ///
    /// Call periodically from a maintenance task. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.identities.len();
        windows.identities.retain(|_, state| {
            state.prune(now);
            state.ban_active(now) || !state.recent.is_empty()
        });
        prune_older_than(&mut windows.global, now, GLOBAL_WINDOW);
        before - windows.identities.len()
    }

    pub fn stats(&self) -> RateLimitStats {
        let windows = self.windows.lock();
        RateLimitStats {
            tracked_identities: windows.identities.len(),
            banned_identities: windows
                .identities
                .values()
                .filter(|s| s.banned_until.is_some())
                .count(),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate limiter statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStats {
    pub tracked_identities: usize,
    /// Identities with a ban recorded, expired or not.
    pub banned_identities: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            max_per_10s: 3,
            max_per_minute: 5,
            ban_duration_secs: 120,
            max_global_per_second: 100,
        }
    }

    const ALICE: &str = "alice!a@example.net";

    #[test]
    fn test_exactly_limit_succeeds_and_next_fails() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();

        for i in 0..3 {
            let now = t0 + Duration::from_millis(i * 100);
            assert_eq!(limiter.check_at(ALICE, now), RateVerdict::Admitted);
        }
        assert_eq!(
            limiter.check_at(ALICE, t0 + Duration::from_millis(900)),
            RateVerdict::ShortWindow
        );
    }

    #[test]
    fn test_short_window_slides() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(ALICE, t0).is_admitted());
        }
        assert!(!limiter.check_at(ALICE, t0 + Duration::from_secs(9)).is_admitted());
        assert!(limiter.check_at(ALICE, t0 + Duration::from_secs(10)).is_admitted());
    }

    #[test]
    fn test_minute_window_bans() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        // Spread out to stay clear of the 10 second window.
        for i in 0..5 {
            let now = t0 + Duration::from_secs(i * 11);
            assert!(limiter.check_at(ALICE, now).is_admitted());
        }
        let now = t0 + Duration::from_secs(56);
        assert_eq!(limiter.check_at(ALICE, now), RateVerdict::LongWindow);
        assert!(limiter.is_banned_at(ALICE, now + Duration::from_secs(119)));

        // Windows are long clear but the ban still holds.
        let later = now + Duration::from_secs(100);
        assert_eq!(limiter.check_at(ALICE, later), RateVerdict::Banned);
    }

    #[test]
    fn test_huge_ban_duration_is_capped() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_per_minute: 1,
            ban_duration_secs: u64::MAX,
            ..test_config()
        });
        let t0 = Instant::now();
        assert!(limiter.check_at(ALICE, t0).is_admitted());
        assert_eq!(limiter.check_at(ALICE, t0), RateVerdict::LongWindow);
        let much_later = t0 + Duration::from_secs(10 * 365 * 24 * 60 * 60);
        assert_eq!(limiter.check_at(ALICE, much_later), RateVerdict::Banned);
    }

    #[test]
    fn test_expired_ban_is_cleared_on_next_check() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        limiter.ban_until(ALICE, t0);
        assert_eq!(limiter.stats().banned_identities, 1);

        let now = t0 + Duration::from_secs(1);
        assert_eq!(limiter.check_at(ALICE, now), RateVerdict::Admitted);
        assert_eq!(limiter.stats().banned_identities, 0);
    }

    #[test]
    fn test_global_window_independent_of_identity() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_global_per_second: 2,
            ..test_config()
        });
        let t0 = Instant::now();
        assert!(limiter.check_at("a!a@h", t0).is_admitted());
        assert!(limiter.check_at("b!b@h", t0).is_admitted());
        assert_eq!(limiter.check_at("c!c@h", t0), RateVerdict::Global);
        assert!(limiter.check_at("c!c@h", t0 + Duration::from_secs(1)).is_admitted());
    }

    #[test]
    fn test_rejected_attempts_are_not_recorded() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        for _ in 0..3 {
            limiter.check_at(ALICE, t0);
        }
        for _ in 0..10 {
            assert!(!limiter.check_at(ALICE, t0).is_admitted());
        }
        // Only three were recorded, so the minute window is not reached.
        assert!(limiter.check_at(ALICE, t0 + Duration::from_secs(10)).is_admitted());
    }

    #[test]
    fn test_different_identities_independent() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        for _ in 0..3 {
            limiter.check_at(ALICE, t0);
        }
        assert!(!limiter.check_at(ALICE, t0).is_admitted());
        assert!(limiter.check_at("bob!b@example.net", t0).is_admitted());
    }

    #[test]
    fn test_cleanup_keeps_banned_and_recent() {
        let limiter = RateLimiter::new(test_config());
        let t0 = Instant::now();
        limiter.check_at("quiet!q@h", t0);
        limiter.check_at("recent!r@h", t0 + Duration::from_secs(50));
        limiter.ban_until("banned!b@h", t0 + Duration::from_secs(600));

        let removed = limiter.cleanup_at(t0 + Duration::from_secs(70));
        assert_eq!(removed, 1);
        assert_eq!(limiter.stats().tracked_identities, 2);
    }
}
