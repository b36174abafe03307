//! User entity as the authentication framework sees it.

use serde::{Deserialize, Serialize};

use super::deserialize_some;
use crate::domain::foundation::{Timestamp, UserId};

/// A persisted user.
///
/// Optional text fields are never `Some("")`: an empty string is stored and
/// read back as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: Option<Timestamp>,
    pub image: Option<String>,
}

/// Input to `create_user`.
///
/// `id` is normally left empty so the store assigns one; a client supplied
/// id is passed through and validated by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<Timestamp>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            email: email.into(),
            email_verified: None,
            image: None,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email_verified(mut self, at: Timestamp) -> Self {
        self.email_verified = Some(at);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Partial update for `update_user`.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub id: UserId,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_verified: Option<Option<Timestamp>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<String>>,
}

impl UserUpdate {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            email: None,
            email_verified: None,
            image: None,
        }
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn email_verified(mut self, at: Option<Timestamp>) -> Self {
        self.email_verified = Some(at);
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }

    /// True when the update would not change any field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.email_verified.is_none()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_serializes_with_framework_field_names() {
        let user = User {
            id: UserId::new("u1").unwrap(),
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
            email_verified: Some(Timestamp::from_unix_secs(1705276800)),
            image: None,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["emailVerified"], json!("2024-01-15T00:00:00Z"));
        assert_eq!(value["image"], json!(null));
    }

    #[test]
    fn update_distinguishes_untouched_from_cleared() {
        let update: UserUpdate =
            serde_json::from_value(json!({"id": "u1", "image": null})).unwrap();

        assert_eq!(update.image, Some(None));
        assert_eq!(update.name, None);
        assert!(!update.is_empty());
    }

    #[test]
    fn update_with_only_id_is_empty() {
        let update = UserUpdate::new(UserId::new("u1").unwrap());
        assert!(update.is_empty());
    }

    #[test]
    fn new_user_builder_sets_fields() {
        let user = NewUser::new("a@x.com").with_name("A").with_image("https://x/a.png");
        assert_eq!(user.name.as_deref(), Some("A"));
        assert_eq!(user.image.as_deref(), Some("https://x/a.png"));
        assert!(user.id.is_none());
    }
}
