//! Single-use verification tokens (magic links, email confirmation).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// A verification token. Unique on `(identifier, token)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: Timestamp,
}

impl VerificationToken {
    pub fn new(identifier: impl Into<String>, token: impl Into<String>, expires: Timestamp) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
            expires,
        }
    }

    pub fn key(&self) -> VerificationTokenKey {
        VerificationTokenKey::new(&self.identifier, &self.token)
    }
}

/// Lookup key for `use_verification_token`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationTokenKey {
    pub identifier: String,
    pub token: String,
}

impl VerificationTokenKey {
    pub fn new(identifier: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
        }
    }
}
