//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types shared by the
//! authentication entities and the store schema.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{SessionToken, UserId};
pub use timestamp::Timestamp;
