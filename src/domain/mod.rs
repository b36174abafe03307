//! Domain layer - authentication entities, shared primitives and the
//! declarative store schema.

pub mod auth;
pub mod foundation;
pub mod schema;
