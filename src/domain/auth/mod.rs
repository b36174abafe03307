//! Authentication entities in the shapes the framework expects.
//!
//! These types know nothing about how the store names its columns; that
//! translation lives in `application::field_mapper`.

mod account;
mod authenticator;
mod session;
mod user;
mod verification_token;

pub use account::{Account, AccountKey, AccountType};
pub use authenticator::Authenticator;
pub use session::{Session, SessionAndUser, SessionUpdate};
pub use user::{NewUser, User, UserUpdate};
pub use verification_token::{VerificationToken, VerificationTokenKey};

use serde::{Deserialize, Deserializer};

/// Wraps a present value in `Some` so `Option<Option<T>>` fields can tell
/// "explicit null" apart from "missing".
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
