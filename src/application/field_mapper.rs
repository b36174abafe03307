//! Field mapper - converts between auth entities and store records.
//!
//! This is the only module that knows the store's column names. Everything
//! it writes follows one convention: an absent optional value, or an empty
//! optional string, is written as `null`. On the way back both `null` and `""` (the store's zero value for
//! text, email, date and relation columns) read as absent.
//!
//! Dates are written as RFC 3339 and read from either RFC 3339 or the
//! store's `YYYY-MM-DD HH:MM:SS.sssZ` layout.

use serde_json::{json, Value};

use crate::domain::auth::{
    Account, AccountKey, AccountType, Authenticator, NewUser, Session, SessionUpdate, User,
    UserUpdate, VerificationToken, VerificationTokenKey,
};
use crate::domain::foundation::{SessionToken, Timestamp, UserId, ValidationError};
use crate::domain::schema::columns::{accounts, authenticators, sessions, users, verification_tokens};
use crate::ports::{AdapterError, AdapterResult, Filter, RecordData, StoreRecord};

// ════════════════════════════════════════════════════════════════════════════
// Reading helpers
// ════════════════════════════════════════════════════════════════════════════

fn optional_string(
    record: &StoreRecord,
    collection: &str,
    column: &str,
) -> AdapterResult<Option<String>> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AdapterError::mapping(
            collection,
            column,
            format!("expected a string, got {}", other),
        )),
    }
}

fn required_string(record: &StoreRecord, collection: &str, column: &str) -> AdapterResult<String> {
    optional_string(record, collection, column)?
        .ok_or_else(|| AdapterError::mapping(collection, column, "missing required value"))
}

fn optional_timestamp(
    record: &StoreRecord,
    collection: &str,
    column: &str,
) -> AdapterResult<Option<Timestamp>> {
    optional_string(record, collection, column)?
        .map(|raw| {
            Timestamp::parse(&raw)
                .map_err(|e| AdapterError::mapping(collection, column, e.to_string()))
        })
        .transpose()
}

fn required_timestamp(
    record: &StoreRecord,
    collection: &str,
    column: &str,
) -> AdapterResult<Timestamp> {
    optional_timestamp(record, collection, column)?
        .ok_or_else(|| AdapterError::mapping(collection, column, "missing required value"))
}

fn optional_integer(
    record: &StoreRecord,
    collection: &str,
    column: &str,
) -> AdapterResult<Option<i64>> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| AdapterError::mapping(collection, column, "number out of range")),
        Some(other) => Err(AdapterError::mapping(
            collection,
            column,
            format!("expected a number, got {}", other),
        )),
    }
}

fn boolean(record: &StoreRecord, collection: &str, column: &str) -> AdapterResult<bool> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(AdapterError::mapping(
            collection,
            column,
            format!("expected a boolean, got {}", other),
        )),
    }
}

fn relation(record: &StoreRecord, collection: &str, column: &str) -> AdapterResult<Option<UserId>> {
    optional_string(record, collection, column)?
        .map(|id| UserId::new(id).map_err(AdapterError::from))
        .transpose()
}

fn record_user_id(record: &StoreRecord) -> AdapterResult<UserId> {
    UserId::new(record.id.clone()).map_err(AdapterError::from)
}

// ════════════════════════════════════════════════════════════════════════════
// Writing helpers
// ════════════════════════════════════════════════════════════════════════════

/// `Some("")` is written as `null` so it reads back the same as `None`.
fn opt_str(value: &Option<String>) -> Value {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map_or(Value::Null, |s| json!(s))
}

fn opt_timestamp(value: &Option<Timestamp>) -> Value {
    value.as_ref().map_or(Value::Null, |ts| json!(ts.to_rfc3339()))
}

// ════════════════════════════════════════════════════════════════════════════
// Users
// ════════════════════════════════════════════════════════════════════════════

pub fn new_user_to_record(user: &NewUser) -> RecordData {
    let mut data = RecordData::new();
    if let Some(id) = &user.id {
        data.insert("id".to_string(), json!(id.as_str()));
    }
    data.insert(users::NAME.to_string(), opt_str(&user.name));
    data.insert(users::EMAIL.to_string(), json!(user.email));
    data.insert(users::EMAIL_VERIFIED.to_string(), opt_timestamp(&user.email_verified));
    data.insert(users::IMAGE.to_string(), opt_str(&user.image));
    data
}

/// Only the fields set on `update` become columns.
pub fn user_update_to_patch(update: &UserUpdate) -> RecordData {
    let mut patch = RecordData::new();
    if let Some(name) = &update.name {
        patch.insert(users::NAME.to_string(), opt_str(name));
    }
    if let Some(email) = &update.email {
        patch.insert(users::EMAIL.to_string(), json!(email));
    }
    if let Some(verified) = &update.email_verified {
        patch.insert(users::EMAIL_VERIFIED.to_string(), opt_timestamp(verified));
    }
    if let Some(image) = &update.image {
        patch.insert(users::IMAGE.to_string(), opt_str(image));
    }
    patch
}

pub fn user_from_record(record: &StoreRecord) -> AdapterResult<User> {
    let c = users::COLLECTION;
    Ok(User {
        id: record_user_id(record)?,
        name: optional_string(record, c, users::NAME)?,
        email: required_string(record, c, users::EMAIL)?,
        email_verified: optional_timestamp(record, c, users::EMAIL_VERIFIED)?,
        image: optional_string(record, c, users::IMAGE)?,
    })
}

pub fn user_email_filter(email: &str) -> Filter {
    Filter::eq(users::EMAIL, email)
}

// ════════════════════════════════════════════════════════════════════════════
// Accounts
// ════════════════════════════════════════════════════════════════════════════

pub fn account_to_record(account: &Account) -> RecordData {
    let mut data = RecordData::new();
    data.insert(accounts::TYPE.to_string(), json!(account.account_type.as_str()));
    data.insert(accounts::PROVIDER.to_string(), json!(account.provider));
    data.insert(
        accounts::PROVIDER_ACCOUNT_ID.to_string(),
        json!(account.provider_account_id),
    );
    data.insert(accounts::USER.to_string(), json!(account.user_id.as_str()));
    data.insert(accounts::REFRESH_TOKEN.to_string(), opt_str(&account.refresh_token));
    data.insert(accounts::ACCESS_TOKEN.to_string(), opt_str(&account.access_token));
    data.insert(
        accounts::EXPIRES_AT.to_string(),
        account.expires_at.map_or(Value::Null, |at| json!(at)),
    );
    data.insert(accounts::TOKEN_TYPE.to_string(), opt_str(&account.token_type));
    data.insert(accounts::SCOPE.to_string(), opt_str(&account.scope));
    data.insert(accounts::ID_TOKEN.to_string(), opt_str(&account.id_token));
    data.insert(accounts::SESSION_STATE.to_string(), opt_str(&account.session_state));
    data
}

/// Reads an account. Fails when the user relation has been unset; use
/// [`account_user_id`] first where a dangling account is expected.
pub fn account_from_record(record: &StoreRecord) -> AdapterResult<Account> {
    let c = accounts::COLLECTION;
    let account_type: AccountType = required_string(record, c, accounts::TYPE)?
        .parse()
        .map_err(|e: ValidationError| AdapterError::mapping(c, accounts::TYPE, e.to_string()))?;
    let user_id = relation(record, c, accounts::USER)?
        .ok_or_else(|| AdapterError::mapping(c, accounts::USER, "relation is empty"))?;

    Ok(Account {
        user_id,
        account_type,
        provider: required_string(record, c, accounts::PROVIDER)?,
        provider_account_id: required_string(record, c, accounts::PROVIDER_ACCOUNT_ID)?,
        refresh_token: optional_string(record, c, accounts::REFRESH_TOKEN)?,
        access_token: optional_string(record, c, accounts::ACCESS_TOKEN)?,
        // Unset number columns come back as 0.
        expires_at: optional_integer(record, c, accounts::EXPIRES_AT)?.filter(|at| *at != 0),
        token_type: optional_string(record, c, accounts::TOKEN_TYPE)?,
        scope: optional_string(record, c, accounts::SCOPE)?,
        id_token: optional_string(record, c, accounts::ID_TOKEN)?,
        session_state: optional_string(record, c, accounts::SESSION_STATE)?,
    })
}

/// The user an account points at, `None` once that user has been deleted.
pub fn account_user_id(record: &StoreRecord) -> AdapterResult<Option<UserId>> {
    relation(record, accounts::COLLECTION, accounts::USER)
}

pub fn account_key_filter(key: &AccountKey) -> Filter {
    Filter::eq(accounts::PROVIDER, key.provider.as_str())
        .and_eq(accounts::PROVIDER_ACCOUNT_ID, key.provider_account_id.as_str())
}

pub fn accounts_of_user_filter(user_id: &UserId) -> Filter {
    Filter::eq(accounts::USER, user_id.as_str())
}

// ════════════════════════════════════════════════════════════════════════════
// Sessions
// ════════════════════════════════════════════════════════════════════════════

pub fn session_to_record(session: &Session) -> RecordData {
    let mut data = RecordData::new();
    data.insert(
        sessions::SESSION_TOKEN.to_string(),
        json!(session.session_token.as_str()),
    );
    data.insert(sessions::USER.to_string(), json!(session.user_id.as_str()));
    data.insert(sessions::EXPIRES.to_string(), json!(session.expires.to_rfc3339()));
    data
}

/// The session token is the lookup key and never part of the patch.
pub fn session_update_to_patch(update: &SessionUpdate) -> RecordData {
    let mut patch = RecordData::new();
    if let Some(expires) = &update.expires {
        patch.insert(sessions::EXPIRES.to_string(), json!(expires.to_rfc3339()));
    }
    if let Some(user_id) = &update.user_id {
        patch.insert(sessions::USER.to_string(), json!(user_id.as_str()));
    }
    patch
}

pub fn session_from_record(record: &StoreRecord) -> AdapterResult<Session> {
    let c = sessions::COLLECTION;
    let session_token = SessionToken::new(required_string(record, c, sessions::SESSION_TOKEN)?)?;
    let user_id = relation(record, c, sessions::USER)?
        .ok_or_else(|| AdapterError::mapping(c, sessions::USER, "relation is empty"))?;

    Ok(Session {
        session_token,
        user_id,
        expires: required_timestamp(record, c, sessions::EXPIRES)?,
    })
}

/// The user a session points at, `None` once that user has been deleted.
pub fn session_user_id(record: &StoreRecord) -> AdapterResult<Option<UserId>> {
    relation(record, sessions::COLLECTION, sessions::USER)
}

pub fn session_token_filter(token: &SessionToken) -> Filter {
    Filter::eq(sessions::SESSION_TOKEN, token.as_str())
}

pub fn sessions_of_user_filter(user_id: &UserId) -> Filter {
    Filter::eq(sessions::USER, user_id.as_str())
}

// ════════════════════════════════════════════════════════════════════════════
// Verification tokens
// ════════════════════════════════════════════════════════════════════════════

pub fn verification_token_to_record(token: &VerificationToken) -> RecordData {
    let mut data = RecordData::new();
    data.insert(verification_tokens::IDENTIFIER.to_string(), json!(token.identifier));
    data.insert(verification_tokens::TOKEN.to_string(), json!(token.token));
    data.insert(
        verification_tokens::EXPIRES.to_string(),
        json!(token.expires.to_rfc3339()),
    );
    data
}

pub fn verification_token_from_record(record: &StoreRecord) -> AdapterResult<VerificationToken> {
    let c = verification_tokens::COLLECTION;
    Ok(VerificationToken {
        identifier: required_string(record, c, verification_tokens::IDENTIFIER)?,
        token: required_string(record, c, verification_tokens::TOKEN)?,
        expires: required_timestamp(record, c, verification_tokens::EXPIRES)?,
    })
}

pub fn verification_token_filter(key: &VerificationTokenKey) -> Filter {
    Filter::eq(verification_tokens::IDENTIFIER, key.identifier.as_str())
        .and_eq(verification_tokens::TOKEN, key.token.as_str())
}

// ════════════════════════════════════════════════════════════════════════════
// Authenticators
// ════════════════════════════════════════════════════════════════════════════

pub fn authenticator_to_record(authenticator: &Authenticator) -> RecordData {
    let mut data = RecordData::new();
    data.insert(
        authenticators::CREDENTIAL_ID.to_string(),
        json!(authenticator.credential_id),
    );
    data.insert(authenticators::USER.to_string(), json!(authenticator.user_id.as_str()));
    data.insert(
        authenticators::PROVIDER_ACCOUNT_ID.to_string(),
        json!(authenticator.provider_account_id),
    );
    data.insert(
        authenticators::CREDENTIAL_PUBLIC_KEY.to_string(),
        json!(authenticator.credential_public_key),
    );
    data.insert(authenticators::COUNTER.to_string(), json!(authenticator.counter));
    data.insert(
        authenticators::CREDENTIAL_DEVICE_TYPE.to_string(),
        json!(authenticator.credential_device_type),
    );
    data.insert(
        authenticators::CREDENTIAL_BACKED_UP.to_string(),
        json!(authenticator.credential_backed_up),
    );
    data.insert(authenticators::TRANSPORTS.to_string(), opt_str(&authenticator.transports));
    data
}

pub fn authenticator_counter_patch(counter: i64) -> RecordData {
    let mut patch = RecordData::new();
    patch.insert(authenticators::COUNTER.to_string(), json!(counter));
    patch
}

pub fn authenticator_from_record(record: &StoreRecord) -> AdapterResult<Authenticator> {
    let c = authenticators::COLLECTION;
    let user_id = relation(record, c, authenticators::USER)?
        .ok_or_else(|| AdapterError::mapping(c, authenticators::USER, "relation is empty"))?;

    Ok(Authenticator {
        credential_id: required_string(record, c, authenticators::CREDENTIAL_ID)?,
        user_id,
        provider_account_id: required_string(record, c, authenticators::PROVIDER_ACCOUNT_ID)?,
        credential_public_key: required_string(record, c, authenticators::CREDENTIAL_PUBLIC_KEY)?,
        counter: optional_integer(record, c, authenticators::COUNTER)?.unwrap_or(0),
        credential_device_type: required_string(record, c, authenticators::CREDENTIAL_DEVICE_TYPE)?,
        credential_backed_up: boolean(record, c, authenticators::CREDENTIAL_BACKED_UP)?,
        transports: optional_string(record, c, authenticators::TRANSPORTS)?,
    })
}

pub fn authenticator_credential_filter(credential_id: &str) -> Filter {
    Filter::eq(authenticators::CREDENTIAL_ID, credential_id)
}

pub fn authenticators_of_user_filter(user_id: &UserId) -> Filter {
    Filter::eq(authenticators::USER, user_id.as_str())
}
