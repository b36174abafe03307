//! Database sessions.

use serde::{Deserialize, Serialize};

use super::User;
use crate::domain::foundation::{SessionToken, Timestamp, UserId};

/// A persisted session. Expiry is advisory: nothing sweeps expired rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_token: SessionToken,
    pub user_id: UserId,
    pub expires: Timestamp,
}

impl Session {
    pub fn new(session_token: SessionToken, user_id: UserId, expires: Timestamp) -> Self {
        Self {
            session_token,
            user_id,
            expires,
        }
    }

    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        !self.expires.is_after(now)
    }
}

/// Mutable session fields, located by token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub session_token: SessionToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl SessionUpdate {
    pub fn new(session_token: SessionToken) -> Self {
        Self {
            session_token,
            expires: None,
            user_id: None,
        }
    }

    pub fn expires(mut self, expires: Timestamp) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Result of `get_session_and_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAndUser {
    pub session: Session,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires: Timestamp) -> Session {
        Session::new(
            SessionToken::new("t1").unwrap(),
            UserId::new("u1").unwrap(),
            expires,
        )
    }

    #[test]
    fn session_is_expired_at_its_expiry() {
        let now = Timestamp::from_unix_secs(1_000);
        assert!(session(now).is_expired_at(&now));
        assert!(!session(now.plus_secs(1)).is_expired_at(&now));
    }

    #[test]
    fn session_update_serializes_only_set_fields() {
        let update = SessionUpdate::new(SessionToken::new("t1").unwrap())
            .expires(Timestamp::from_unix_secs(0));
        let value = serde_json::to_value(&update).unwrap();

        assert!(value.get("expires").is_some());
        assert!(value.get("userId").is_none());
    }
}
