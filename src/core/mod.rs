//! Core building blocks shared by every component
//!
//! This module contains:
//! - The caller-facing error taxonomy
//! - Clock abstraction (system and manual clocks)
//! - Opaque identifier generation

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoordinatorError, Result};
pub use id::generate_id;
