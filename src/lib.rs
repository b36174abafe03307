//! PocketBase Auth Adapter - authentication persistence over PocketBase
//!
//! Maps the user, account, session, verification-token and authenticator
//! operations of an authentication framework onto PocketBase collections
//! with prefixed snake_case columns.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
