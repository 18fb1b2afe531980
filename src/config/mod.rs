//! Runtime configuration
//!
//! All tunable limits (expiry windows, rate limits, member caps, fee model,
//! chain prefixes) live in a single [`Policy`] value that is injected into
//! the service at construction time.

pub mod policy;

pub use policy::{ConfigError, Policy, RateLimit};
