//! Validation layer
//!
//! Side-effect free gatekeeping applied before any mutation:
//! - Bech32 address checks (account vs. validator prefix)
//! - Public key length checks
//! - Amount parsing and denomination allow-list
//! - Free-text length and script-injection screening
//! - Sliding-window rate limiting

pub mod errors;
pub mod rate_limit;
pub mod rules;

pub use errors::{ValidationErrors, Violation};
pub use rate_limit::{enforce, rate_key, InMemoryRateLimiter, RateLimiter};
pub use rules::{
    check_address, check_public_key, check_text, parse_amount, sanitize_text, AddressKind,
    Validator,
};
