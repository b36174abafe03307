//! Auth adapter port - the persistence surface an authentication framework calls.
//!
//! Every operation is optional. Each method has a default body returning
//! `AdapterError::Unsupported`, and `capabilities()` reports what an
//! implementation actually serves. Callers should check the set before
//! invoking an operation rather than relying on the error.
//!
//! # Example
//!
//! ```ignore
//! async fn sign_in_with_provider(
//!     adapter: Arc<dyn AuthAdapter>,
//!     key: &AccountKey,
//! ) -> AdapterResult<Option<User>> {
//!     if !adapter.capabilities().contains(Capability::GetUserByAccount) {
//!         return Ok(None);
//!     }
//!     adapter.get_user_by_account(key).await
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;

use super::record_store::StoreError;
use crate::domain::auth::{
    Account, AccountKey, Authenticator, NewUser, Session, SessionAndUser, SessionUpdate, User,
    UserUpdate, VerificationToken, VerificationTokenKey,
};
use crate::domain::foundation::{SessionToken, UserId, ValidationError};

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors from adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The store rejected the request. Passed through unmodified.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A lookup that precedes a required mutation found nothing.
    #[error("{collection} record not found for {key}")]
    NotFound { collection: String, key: String },

    #[error("operation not supported: {0}")]
    Unsupported(Capability),

    /// A store record could not be converted into its entity.
    #[error("cannot map {collection}.{field}: {reason}")]
    Mapping {
        collection: String,
        field: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AdapterError {
    pub fn not_found(collection: &str, key: impl fmt::Display) -> Self {
        AdapterError::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn mapping(collection: &str, field: &str, reason: impl Into<String>) -> Self {
        AdapterError::Mapping {
            collection: collection.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// The underlying store error, if this came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            AdapterError::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// One optional adapter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    CreateUser,
    GetUser,
    GetUserByEmail,
    GetUserByAccount,
    UpdateUser,
    DeleteUser,
    LinkAccount,
    UnlinkAccount,
    GetAccount,
    CreateSession,
    GetSessionAndUser,
    UpdateSession,
    DeleteSession,
    CreateVerificationToken,
    UseVerificationToken,
    CreateAuthenticator,
    GetAuthenticator,
    ListAuthenticatorsByUserId,
    UpdateAuthenticatorCounter,
}

impl Capability {
    pub fn all() -> &'static [Capability] {
        &[
            Capability::CreateUser,
            Capability::GetUser,
            Capability::GetUserByEmail,
            Capability::GetUserByAccount,
            Capability::UpdateUser,
            Capability::DeleteUser,
            Capability::LinkAccount,
            Capability::UnlinkAccount,
            Capability::GetAccount,
            Capability::CreateSession,
            Capability::GetSessionAndUser,
            Capability::UpdateSession,
            Capability::DeleteSession,
            Capability::CreateVerificationToken,
            Capability::UseVerificationToken,
            Capability::CreateAuthenticator,
            Capability::GetAuthenticator,
            Capability::ListAuthenticatorsByUserId,
            Capability::UpdateAuthenticatorCounter,
        ]
    }

    /// The framework's name for the operation.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Capability::CreateUser => "createUser",
            Capability::GetUser => "getUser",
            Capability::GetUserByEmail => "getUserByEmail",
            Capability::GetUserByAccount => "getUserByAccount",
            Capability::UpdateUser => "updateUser",
            Capability::DeleteUser => "deleteUser",
            Capability::LinkAccount => "linkAccount",
            Capability::UnlinkAccount => "unlinkAccount",
            Capability::GetAccount => "getAccount",
            Capability::CreateSession => "createSession",
            Capability::GetSessionAndUser => "getSessionAndUser",
            Capability::UpdateSession => "updateSession",
            Capability::DeleteSession => "deleteSession",
            Capability::CreateVerificationToken => "createVerificationToken",
            Capability::UseVerificationToken => "useVerificationToken",
            Capability::CreateAuthenticator => "createAuthenticator",
            Capability::GetAuthenticator => "getAuthenticator",
            Capability::ListAuthenticatorsByUserId => "listAuthenticatorsByUserId",
            Capability::UpdateAuthenticatorCounter => "updateAuthenticatorCounter",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// The set of operations an adapter serves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::all().iter().copied().collect()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.0.remove(&capability);
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Port for authentication-framework persistence.
///
/// # Contract
///
/// Implementations must:
/// - Return `Ok(None)` for reads that legitimately miss
/// - Propagate store constraint violations as `AdapterError::Store` unmodified
/// - Return `AdapterError::Unsupported` for operations not in `capabilities()`
#[async_trait]
pub trait AuthAdapter: Send + Sync {
    /// Operations this adapter serves.
    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::empty()
    }

    async fn create_user(&self, _user: NewUser) -> AdapterResult<User> {
        Err(AdapterError::Unsupported(Capability::CreateUser))
    }

    async fn get_user(&self, _id: &UserId) -> AdapterResult<Option<User>> {
        Err(AdapterError::Unsupported(Capability::GetUser))
    }

    async fn get_user_by_email(&self, _email: &str) -> AdapterResult<Option<User>> {
        Err(AdapterError::Unsupported(Capability::GetUserByEmail))
    }

    /// The user linked to the account with this key.
    async fn get_user_by_account(&self, _key: &AccountKey) -> AdapterResult<Option<User>> {
        Err(AdapterError::Unsupported(Capability::GetUserByAccount))
    }

    /// Patches only the fields set on `update`.
    async fn update_user(&self, _update: UserUpdate) -> AdapterResult<User> {
        Err(AdapterError::Unsupported(Capability::UpdateUser))
    }

    /// Deletes the user and returns it. Dependent records are left in place.
    async fn delete_user(&self, _id: &UserId) -> AdapterResult<Option<User>> {
        Err(AdapterError::Unsupported(Capability::DeleteUser))
    }

    async fn link_account(&self, _account: Account) -> AdapterResult<Account> {
        Err(AdapterError::Unsupported(Capability::LinkAccount))
    }

    /// Deletes the account and returns it as it was before deletion.
    ///
    /// An account whose user no longer exists is still deleted, so its
    /// provider key can be linked again, and the call returns `NotFound`.
    async fn unlink_account(&self, _key: &AccountKey) -> AdapterResult<Account> {
        Err(AdapterError::Unsupported(Capability::UnlinkAccount))
    }

    async fn get_account(&self, _key: &AccountKey) -> AdapterResult<Option<Account>> {
        Err(AdapterError::Unsupported(Capability::GetAccount))
    }

    async fn create_session(&self, _session: Session) -> AdapterResult<Session> {
        Err(AdapterError::Unsupported(Capability::CreateSession))
    }

    /// The session and its user, only when both exist. Expiry is not checked.
    async fn get_session_and_user(
        &self,
        _token: &SessionToken,
    ) -> AdapterResult<Option<SessionAndUser>> {
        Err(AdapterError::Unsupported(Capability::GetSessionAndUser))
    }

    async fn update_session(&self, _update: SessionUpdate) -> AdapterResult<Session> {
        Err(AdapterError::Unsupported(Capability::UpdateSession))
    }

    /// Deletes the session and returns it as it was before deletion.
    async fn delete_session(&self, _token: &SessionToken) -> AdapterResult<Option<Session>> {
        Err(AdapterError::Unsupported(Capability::DeleteSession))
    }

    async fn create_verification_token(
        &self,
        _token: VerificationToken,
    ) -> AdapterResult<VerificationToken> {
        Err(AdapterError::Unsupported(Capability::CreateVerificationToken))
    }

    /// Consumes the token: returns it and deletes it. A second call returns `None`.
    async fn use_verification_token(
        &self,
        _key: &VerificationTokenKey,
    ) -> AdapterResult<Option<VerificationToken>> {
        Err(AdapterError::Unsupported(Capability::UseVerificationToken))
    }

    async fn create_authenticator(
        &self,
        _authenticator: Authenticator,
    ) -> AdapterResult<Authenticator> {
        Err(AdapterError::Unsupported(Capability::CreateAuthenticator))
    }

    async fn get_authenticator(&self, _credential_id: &str) -> AdapterResult<Option<Authenticator>> {
        Err(AdapterError::Unsupported(Capability::GetAuthenticator))
    }

    async fn list_authenticators_by_user_id(
        &self,
        _user_id: &UserId,
    ) -> AdapterResult<Vec<Authenticator>> {
        Err(AdapterError::Unsupported(Capability::ListAuthenticatorsByUserId))
    }

    async fn update_authenticator_counter(
        &self,
        _credential_id: &str,
        _counter: i64,
    ) -> AdapterResult<Authenticator> {
        Err(AdapterError::Unsupported(Capability::UpdateAuthenticatorCounter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::record_store::StoreErrorCode;

    /// Serves only user reads, from a fixed list.
    struct ReadOnlyUsers {
        users: Vec<User>,
    }

    #[async_trait]
    impl AuthAdapter for ReadOnlyUsers {
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::empty().with(Capability::GetUser)
        }

        async fn get_user(&self, id: &UserId) -> AdapterResult<Option<User>> {
            Ok(self.users.iter().find(|u| &u.id == id).cloned())
        }
    }

    fn test_user() -> User {
        User {
            id: UserId::new("user-123").unwrap(),
            name: None,
            email: "test@example.com".to_string(),
            email_verified: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn overridden_operation_is_served() {
        let adapter = ReadOnlyUsers {
            users: vec![test_user()],
        };

        let user = adapter
            .get_user(&UserId::new("user-123").unwrap())
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.email), Some("test@example.com".to_string()));
    }

    #[tokio::test]
    async fn default_operation_returns_unsupported() {
        let adapter = ReadOnlyUsers { users: vec![] };

        let result = adapter.get_user_by_email("test@example.com").await;
        assert!(matches!(
            result,
            Err(AdapterError::Unsupported(Capability::GetUserByEmail))
        ));
        assert!(!adapter.capabilities().contains(Capability::GetUserByEmail));
    }

    #[test]
    fn capability_set_all_covers_every_operation() {
        let all = CapabilitySet::all();
        assert_eq!(all.len(), Capability::all().len());

        let narrowed = all.without(Capability::DeleteUser);
        assert!(!narrowed.contains(Capability::DeleteUser));
        assert!(narrowed.contains(Capability::CreateUser));
    }

    #[test]
    fn capability_displays_framework_name() {
        assert_eq!(Capability::UseVerificationToken.to_string(), "useVerificationToken");
        assert_eq!(
            AdapterError::Unsupported(Capability::LinkAccount).to_string(),
            "operation not supported: linkAccount"
        );
    }

    #[test]
    fn store_errors_pass_through_unmodified() {
        let store_err = StoreError::new(StoreErrorCode::Validation, "Failed to create record.");
        let err: AdapterError = store_err.clone().into();
        assert_eq!(err.store_error(), Some(&store_err));
    }

    #[test]
    fn auth_adapter_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn AuthAdapter) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn AuthAdapter>>();
    }
}
