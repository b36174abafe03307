//! Linked provider accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{UserId, ValidationError};

/// Kind of provider an account was linked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Oauth,
    Oidc,
    Email,
    Webauthn,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Oauth => "oauth",
            AccountType::Oidc => "oidc",
            AccountType::Email => "email",
            AccountType::Webauthn => "webauthn",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oauth" => Ok(AccountType::Oauth),
            "oidc" => Ok(AccountType::Oidc),
            "email" => Ok(AccountType::Email),
            "webauthn" => Ok(AccountType::Webauthn),
            other => Err(ValidationError::invalid_format(
                "type",
                format!("unknown account type '{}'", other),
            )),
        }
    }
}

/// Composite key identifying an account: unique per store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub provider: String,
    pub provider_account_id: String,
}

impl AccountKey {
    pub fn new(provider: impl Into<String>, provider_account_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.provider_account_id)
    }
}

/// A provider account linked to a user.
///
/// The OAuth token fields keep their snake_case names on the wire; that is
/// how the framework hands them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(rename = "refresh_token", default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "access_token", default)]
    pub access_token: Option<String>,
    /// Access token expiry, Unix seconds.
    #[serde(rename = "expires_at", default)]
    pub expires_at: Option<i64>,
    #[serde(rename = "token_type", default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(rename = "id_token", default)]
    pub id_token: Option<String>,
    #[serde(rename = "session_state", default)]
    pub session_state: Option<String>,
}

impl Account {
    pub fn new(
        user_id: UserId,
        account_type: AccountType,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            account_type,
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            refresh_token: None,
            access_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            id_token: None,
            session_state: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>, expires_at: Option<i64>) -> Self {
        self.access_token = Some(token.into());
        self.expires_at = expires_at;
        self
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(&self.provider, &self.provider_account_id)
    }
}
