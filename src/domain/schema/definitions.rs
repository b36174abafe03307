//! The five auth collections.

use once_cell::sync::Lazy;

use super::collection::CollectionDefinition;
use super::columns::{accounts, authenticators, sessions, users, verification_tokens};
use super::field::FieldDefinition;

static COLLECTIONS: Lazy<Vec<CollectionDefinition>> = Lazy::new(|| {
    vec![
        users_collection(),
        accounts_collection(),
        sessions_collection(),
        verification_tokens_collection(),
        authenticators_collection(),
    ]
});

/// All auth collections, users first so relations resolve on import.
pub fn collections() -> &'static [CollectionDefinition] {
    &COLLECTIONS
}

/// Looks up a definition by collection name.
pub fn collection(name: &str) -> Option<&'static CollectionDefinition> {
    COLLECTIONS.iter().find(|c| c.name == name)
}

/// The provisioning artifact: the collection list as pretty JSON.
pub fn to_json_pretty() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(collections())
}

fn users_collection() -> CollectionDefinition {
    CollectionDefinition::base(users::COLLECTION_ID, users::COLLECTION)
        .field(FieldDefinition::text(users::NAME).max(255.0))
        .field(FieldDefinition::email(users::EMAIL).required().unique())
        .field(FieldDefinition::date(users::EMAIL_VERIFIED))
        .field(
            FieldDefinition::text(users::IMAGE)
                .max(2048.0)
                .pattern("^https?://"),
        )
}

fn accounts_collection() -> CollectionDefinition {
    CollectionDefinition::base(accounts::COLLECTION_ID, accounts::COLLECTION)
        .field(
            FieldDefinition::text(accounts::TYPE)
                .required()
                .pattern("^(oauth|oidc|email|webauthn)$"),
        )
        .field(FieldDefinition::text(accounts::PROVIDER).required().max(255.0))
        .field(
            FieldDefinition::text(accounts::PROVIDER_ACCOUNT_ID)
                .required()
                .max(255.0),
        )
        .field(FieldDefinition::relation(accounts::USER, users::COLLECTION_ID))
        .field(FieldDefinition::text(accounts::REFRESH_TOKEN))
        .field(FieldDefinition::text(accounts::ACCESS_TOKEN))
        .field(FieldDefinition::number(accounts::EXPIRES_AT).min(0.0))
        .field(FieldDefinition::text(accounts::TOKEN_TYPE))
        .field(FieldDefinition::text(accounts::SCOPE))
        .field(FieldDefinition::text(accounts::ID_TOKEN))
        .field(FieldDefinition::text(accounts::SESSION_STATE))
        .unique_index(
            "idx_accounts_provider_account",
            &[accounts::PROVIDER, accounts::PROVIDER_ACCOUNT_ID],
        )
}

fn sessions_collection() -> CollectionDefinition {
    CollectionDefinition::base(sessions::COLLECTION_ID, sessions::COLLECTION)
        .field(
            FieldDefinition::text(sessions::SESSION_TOKEN)
                .required()
                .unique(),
        )
        .field(FieldDefinition::relation(sessions::USER, users::COLLECTION_ID))
        .field(FieldDefinition::date(sessions::EXPIRES).required())
}

fn verification_tokens_collection() -> CollectionDefinition {
    CollectionDefinition::base(
        verification_tokens::COLLECTION_ID,
        verification_tokens::COLLECTION,
    )
    .field(FieldDefinition::text(verification_tokens::IDENTIFIER).required())
    .field(FieldDefinition::text(verification_tokens::TOKEN).required())
    .field(FieldDefinition::date(verification_tokens::EXPIRES).required())
    .unique_index(
        "idx_verification_tokens_identifier_token",
        &[verification_tokens::IDENTIFIER, verification_tokens::TOKEN],
    )
}

fn authenticators_collection() -> CollectionDefinition {
    CollectionDefinition::base(authenticators::COLLECTION_ID, authenticators::COLLECTION)
        .field(
            FieldDefinition::text(authenticators::CREDENTIAL_ID)
                .required()
                .unique(),
        )
        .field(FieldDefinition::relation(
            authenticators::USER,
            users::COLLECTION_ID,
        ))
        .field(FieldDefinition::text(authenticators::PROVIDER_ACCOUNT_ID).required())
        .field(FieldDefinition::text(authenticators::CREDENTIAL_PUBLIC_KEY).required())
        .field(FieldDefinition::number(authenticators::COUNTER).min(0.0))
        .field(FieldDefinition::text(authenticators::CREDENTIAL_DEVICE_TYPE).required())
        .field(FieldDefinition::bool(authenticators::CREDENTIAL_BACKED_UP))
        .field(FieldDefinition::text(authenticators::TRANSPORTS))
        .unique_index(
            "idx_authenticators_user_credential",
            &[authenticators::USER, authenticators::CREDENTIAL_ID],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldType;

    #[test]
    fn declares_five_collections_users_first() {
        let names: Vec<&str> = collections().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "users",
                "accounts",
                "sessions",
                "verification_tokens",
                "authenticators"
            ]
        );
    }

    #[test]
    fn composite_indexes_are_declared() {
        let indexes: Vec<&String> = collections().iter().flat_map(|c| &c.indexes).collect();

        assert!(indexes.contains(&&"CREATE UNIQUE INDEX idx_accounts_provider_account ON accounts (account_provider, account_provider_account_id)".to_string()));
        assert!(indexes.contains(&&"CREATE UNIQUE INDEX idx_verification_tokens_identifier_token ON verification_tokens (verification_token_identifier, verification_token_token)".to_string()));
        assert!(indexes.contains(&&"CREATE UNIQUE INDEX idx_authenticators_user_credential ON authenticators (authenticator_user, authenticator_credential_id)".to_string()));
    }

    #[test]
    fn relations_target_users_and_never_cascade() {
        let users_id = collection("users").unwrap().id.clone();

        let relations: Vec<_> = collections()
            .iter()
            .flat_map(|c| &c.fields)
            .filter(|f| f.field_type == FieldType::Relation)
            .collect();

        assert_eq!(relations.len(), 3);
        for relation in relations {
            assert_eq!(relation.collection_id.as_deref(), Some(users_id.as_str()));
            assert_eq!(relation.cascade_delete, Some(false));
        }
    }

    #[test]
    fn bool_and_number_columns_are_never_required() {
        for field in collections().iter().flat_map(|c| &c.fields) {
            if matches!(field.field_type, FieldType::Bool | FieldType::Number) {
                assert!(!field.required, "{} must not be required", field.name);
            }
        }
    }

    #[test]
    fn artifact_renders_as_json_array() {
        let json = to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(5));
        assert_eq!(value[0]["fields"][1]["name"], "user_email");
    }
}
