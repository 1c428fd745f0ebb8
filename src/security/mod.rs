//! Admission control for addressed input.
//!
//! - [`rate_limit`]: sliding-window command throttling and bans
//! - [`permissions`]: owner/admin/permission resolution

pub mod permissions;
pub mod rate_limit;

pub use permissions::{ADMIN_PERMISSION, Caller, PermissionGate, UNIVERSAL_PERMISSION};
pub use rate_limit::{RateLimitStats, RateLimiter, RateVerdict};
