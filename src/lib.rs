//! Booker Verify - eventual-consistency checks for booking platform API tests
//!
//! Two pieces do the work: [`poll::poll_until`] waits, within a bounded
//! time, for a re-read of remote state to satisfy a predicate, and
//! [`compare::Comparator`] reports every field-level difference between
//! two serializable values, with tolerance for floating-point fields.

pub mod api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod compare;
pub mod poll;
pub mod testing;
pub mod tokens;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use compare::{compare, Comparator, FieldMismatch, MismatchReport};
pub use poll::{poll_until, try_poll_until, PollConfig, PollResult};
pub use tokens::SeenTokens;
