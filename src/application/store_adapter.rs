//! StoreAuthAdapter - `AuthAdapter` over any `RecordStore`.
//!
//! Each operation is one request, or a short fixed sequence of them awaited
//! in order. Lookups that miss return `None`; constraint violations come back
//! from the store and are propagated unmodified.
//!
//! The delete-returning operations (`unlink_account`, `delete_session`,
//! `use_verification_token`, `delete_user`) read the record and then delete
//! it. The pair is not atomic: if another caller deletes the record in
//! between, the delete reports not-found and the operation returns `None`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::field_mapper as mapper;
use crate::domain::auth::{
    Account, AccountKey, Authenticator, NewUser, Session, SessionAndUser, SessionUpdate, User,
    UserUpdate, VerificationToken, VerificationTokenKey,
};
use crate::domain::foundation::{SessionToken, UserId};
use crate::domain::schema::columns::{accounts, authenticators, sessions, users, verification_tokens};
use crate::ports::{
    AdapterError, AdapterResult, AuthAdapter, Capability, CapabilitySet, Filter, RecordStore,
    StoreError,
};

/// Maps a delete that lost a race to "already gone".
fn deleted(result: Result<(), StoreError>) -> AdapterResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Auth adapter backed by a record store.
pub struct StoreAuthAdapter {
    store: Arc<dyn RecordStore>,
    capabilities: CapabilitySet,
}

impl StoreAuthAdapter {
    /// Create an adapter serving every operation.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            capabilities: CapabilitySet::all(),
        }
    }

    /// Restrict the adapter to `capabilities`.
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Stop serving one operation. It will no longer be advertised and its
    /// method returns `Unsupported` without touching the store.
    pub fn without(mut self, capability: Capability) -> Self {
        self.capabilities = self.capabilities.without(capability);
        self
    }

    fn ensure(&self, capability: Capability) -> AdapterResult<()> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            tracing::debug!(operation = %capability, "Operation disabled");
            Err(AdapterError::Unsupported(capability))
        }
    }

    /// Deletes the user's sessions, accounts and authenticators, then the user.
    ///
    /// Returns the deleted user, or `None` if no such user exists. Each
    /// delete is its own request; a failure part way through leaves the
    /// dependents already removed deleted.
    pub async fn delete_user_and_dependents(&self, id: &UserId) -> AdapterResult<Option<User>> {
        let Some(record) = self.store.get_one(users::COLLECTION, id.as_str()).await? else {
            return Ok(None);
        };
        let user = mapper::user_from_record(&record)?;

        let dependents = [
            (sessions::COLLECTION, mapper::sessions_of_user_filter(id)),
            (accounts::COLLECTION, mapper::accounts_of_user_filter(id)),
            (authenticators::COLLECTION, mapper::authenticators_of_user_filter(id)),
        ];
        for (collection, filter) in &dependents {
            let removed = self.delete_matching(collection, filter).await?;
            tracing::debug!(user_id = %id, collection, removed, "Deleted dependents");
        }

        if !deleted(self.store.delete(users::COLLECTION, id.as_str()).await)? {
            return Ok(None);
        }
        tracing::info!(user_id = %id, "Deleted user and dependents");
        Ok(Some(user))
    }

    async fn delete_matching(&self, collection: &str, filter: &Filter) -> AdapterResult<usize> {
        let records = self.store.get_full_list(collection, filter).await?;
        let mut removed = 0;
        for record in records {
            if deleted(self.store.delete(collection, &record.id).await)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl AuthAdapter for StoreAuthAdapter {
    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Users
    // ════════════════════════════════════════════════════════════════════════════

    async fn create_user(&self, user: NewUser) -> AdapterResult<User> {
        self.ensure(Capability::CreateUser)?;

        let record = self
            .store
            .create(users::COLLECTION, mapper::new_user_to_record(&user))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "createUser rejected by store");
                e
            })?;
        let created = mapper::user_from_record(&record)?;

        tracing::info!(user_id = %created.id, "Created user");
        Ok(created)
    }

    async fn get_user(&self, id: &UserId) -> AdapterResult<Option<User>> {
        self.ensure(Capability::GetUser)?;

        self.store
            .get_one(users::COLLECTION, id.as_str())
            .await?
            .map(|record| mapper::user_from_record(&record))
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>> {
        self.ensure(Capability::GetUserByEmail)?;

        self.store
            .get_first_list_item(users::COLLECTION, &mapper::user_email_filter(email))
            .await?
            .map(|record| mapper::user_from_record(&record))
            .transpose()
    }

    async fn get_user_by_account(&self, key: &AccountKey) -> AdapterResult<Option<User>> {
        self.ensure(Capability::GetUserByAccount)?;

        let Some(account) = self
            .store
            .get_first_list_item(accounts::COLLECTION, &mapper::account_key_filter(key))
            .await?
        else {
            return Ok(None);
        };

        let Some(user_id) = mapper::account_user_id(&account)? else {
            tracing::debug!(account = %key, "Account no longer linked to a user");
            return Ok(None);
        };

        self.store
            .get_one(users::COLLECTION, user_id.as_str())
            .await?
            .map(|record| mapper::user_from_record(&record))
            .transpose()
    }

    async fn update_user(&self, update: UserUpdate) -> AdapterResult<User> {
        self.ensure(Capability::UpdateUser)?;

        let record = self
            .store
            .update(
                users::COLLECTION,
                update.id.as_str(),
                mapper::user_update_to_patch(&update),
            )
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %update.id, error = %e, "updateUser rejected by store");
                e
            })?;

        mapper::user_from_record(&record)
    }

    async fn delete_user(&self, id: &UserId) -> AdapterResult<Option<User>> {
        self.ensure(Capability::DeleteUser)?;

        let Some(record) = self.store.get_one(users::COLLECTION, id.as_str()).await? else {
            return Ok(None);
        };
        let user = mapper::user_from_record(&record)?;

        if !deleted(self.store.delete(users::COLLECTION, id.as_str()).await)? {
            return Ok(None);
        }
        tracing::info!(user_id = %id, "Deleted user");
        Ok(Some(user))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Accounts
    // ════════════════════════════════════════════════════════════════════════════

    async fn link_account(&self, account: Account) -> AdapterResult<Account> {
        self.ensure(Capability::LinkAccount)?;

        let record = self
            .store
            .create(accounts::COLLECTION, mapper::account_to_record(&account))
            .await
            .map_err(|e| {
                tracing::warn!(account = %account.key(), error = %e, "linkAccount rejected by store");
                e
            })?;

        tracing::info!(user_id = %account.user_id, provider = %account.provider, "Linked account");
        mapper::account_from_record(&record)
    }

    async fn unlink_account(&self, key: &AccountKey) -> AdapterResult<Account> {
        self.ensure(Capability::UnlinkAccount)?;

        let record = self
            .store
            .get_first_list_item(accounts::COLLECTION, &mapper::account_key_filter(key))
            .await?
            .ok_or_else(|| AdapterError::not_found(accounts::COLLECTION, key))?;

        if mapper::account_user_id(&record)?.is_none() {
            // Its user is gone; drop the leftover row so the key can be reused.
            deleted(self.store.delete(accounts::COLLECTION, &record.id).await)?;
            tracing::warn!(account = %key, "Removed account whose user no longer exists");
            return Err(AdapterError::not_found(accounts::COLLECTION, key));
        }
        let account = mapper::account_from_record(&record)?;

        if !deleted(self.store.delete(accounts::COLLECTION, &record.id).await)? {
            return Err(AdapterError::not_found(accounts::COLLECTION, key));
        }
        tracing::info!(account = %key, "Unlinked account");
        Ok(account)
    }

    async fn get_account(&self, key: &AccountKey) -> AdapterResult<Option<Account>> {
        self.ensure(Capability::GetAccount)?;

        let Some(record) = self
            .store
            .get_first_list_item(accounts::COLLECTION, &mapper::account_key_filter(key))
            .await?
        else {
            return Ok(None);
        };

        if mapper::account_user_id(&record)?.is_none() {
            return Ok(None);
        }
        mapper::account_from_record(&record).map(Some)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Sessions
    // ════════════════════════════════════════════════════════════════════════════

    async fn create_session(&self, session: Session) -> AdapterResult<Session> {
        self.ensure(Capability::CreateSession)?;

        let record = self
            .store
            .create(sessions::COLLECTION, mapper::session_to_record(&session))
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %session.user_id, error = %e, "createSession rejected by store");
                e
            })?;

        tracing::debug!(user_id = %session.user_id, "Created session");
        mapper::session_from_record(&record)
    }

    async fn get_session_and_user(
        &self,
        token: &SessionToken,
    ) -> AdapterResult<Option<SessionAndUser>> {
        self.ensure(Capability::GetSessionAndUser)?;

        let Some(record) = self
            .store
            .get_first_list_item(sessions::COLLECTION, &mapper::session_token_filter(token))
            .await?
        else {
            return Ok(None);
        };

        let Some(user_id) = mapper::session_user_id(&record)? else {
            tracing::debug!("Session no longer linked to a user");
            return Ok(None);
        };

        let Some(user) = self.store.get_one(users::COLLECTION, user_id.as_str()).await? else {
            return Ok(None);
        };

        Ok(Some(SessionAndUser {
            session: mapper::session_from_record(&record)?,
            user: mapper::user_from_record(&user)?,
        }))
    }

    async fn update_session(&self, update: SessionUpdate) -> AdapterResult<Session> {
        self.ensure(Capability::UpdateSession)?;

        let record = self
            .store
            .get_first_list_item(
                sessions::COLLECTION,
                &mapper::session_token_filter(&update.session_token),
            )
            .await?
            .ok_or_else(|| AdapterError::not_found(sessions::COLLECTION, "sessionToken"))?;

        let patch = mapper::session_update_to_patch(&update);
        if patch.is_empty() {
            return mapper::session_from_record(&record);
        }

        let updated = self
            .store
            .update(sessions::COLLECTION, &record.id, patch)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AdapterError::not_found(sessions::COLLECTION, "sessionToken")
                } else {
                    e.into()
                }
            })?;
        mapper::session_from_record(&updated)
    }

    async fn delete_session(&self, token: &SessionToken) -> AdapterResult<Option<Session>> {
        self.ensure(Capability::DeleteSession)?;

        let Some(record) = self
            .store
            .get_first_list_item(sessions::COLLECTION, &mapper::session_token_filter(token))
            .await?
        else {
            return Ok(None);
        };

        let session = match mapper::session_user_id(&record)? {
            Some(_) => Some(mapper::session_from_record(&record)?),
            None => None,
        };

        if !deleted(self.store.delete(sessions::COLLECTION, &record.id).await)? {
            return Ok(None);
        }
        tracing::debug!("Deleted session");
        Ok(session)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification tokens
    // ════════════════════════════════════════════════════════════════════════════

    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> AdapterResult<VerificationToken> {
        self.ensure(Capability::CreateVerificationToken)?;

        let record = self
            .store
            .create(
                verification_tokens::COLLECTION,
                mapper::verification_token_to_record(&token),
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "createVerificationToken rejected by store");
                e
            })?;

        mapper::verification_token_from_record(&record)
    }

    async fn use_verification_token(
        &self,
        key: &VerificationTokenKey,
    ) -> AdapterResult<Option<VerificationToken>> {
        self.ensure(Capability::UseVerificationToken)?;

        let Some(record) = self
            .store
            .get_first_list_item(
                verification_tokens::COLLECTION,
                &mapper::verification_token_filter(key),
            )
            .await?
        else {
            return Ok(None);
        };
        let token = mapper::verification_token_from_record(&record)?;

        if !deleted(
            self.store
                .delete(verification_tokens::COLLECTION, &record.id)
                .await,
        )? {
            tracing::debug!("Verification token consumed concurrently");
            return Ok(None);
        }
        Ok(Some(token))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Authenticators
    // ════════════════════════════════════════════════════════════════════════════

    async fn create_authenticator(&self, authenticator: Authenticator) -> AdapterResult<Authenticator> {
        self.ensure(Capability::CreateAuthenticator)?;

        let record = self
            .store
            .create(
                authenticators::COLLECTION,
                mapper::authenticator_to_record(&authenticator),
            )
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %authenticator.user_id, error = %e, "createAuthenticator rejected by store");
                e
            })?;

        mapper::authenticator_from_record(&record)
    }

    async fn get_authenticator(&self, credential_id: &str) -> AdapterResult<Option<Authenticator>> {
        self.ensure(Capability::GetAuthenticator)?;

        self.store
            .get_first_list_item(
                authenticators::COLLECTION,
                &mapper::authenticator_credential_filter(credential_id),
            )
            .await?
            .map(|record| mapper::authenticator_from_record(&record))
            .transpose()
    }

    async fn list_authenticators_by_user_id(
        &self,
        user_id: &UserId,
    ) -> AdapterResult<Vec<Authenticator>> {
        self.ensure(Capability::ListAuthenticatorsByUserId)?;

        self.store
            .get_full_list(
                authenticators::COLLECTION,
                &mapper::authenticators_of_user_filter(user_id),
            )
            .await?
            .iter()
            .map(mapper::authenticator_from_record)
            .collect()
    }

    async fn update_authenticator_counter(
        &self,
        credential_id: &str,
        counter: i64,
    ) -> AdapterResult<Authenticator> {
        self.ensure(Capability::UpdateAuthenticatorCounter)?;

        let record = self
            .store
            .get_first_list_item(
                authenticators::COLLECTION,
                &mapper::authenticator_credential_filter(credential_id),
            )
            .await?
            .ok_or_else(|| AdapterError::not_found(authenticators::COLLECTION, credential_id))?;

        let updated = self
            .store
            .update(
                authenticators::COLLECTION,
                &record.id,
                mapper::authenticator_counter_patch(counter),
            )
            .await?;
        mapper::authenticator_from_record(&updated)
    }
}

impl std::fmt::Debug for StoreAuthAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuthAdapter")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRecordStore;
    use crate::domain::auth::AccountType;
    use crate::domain::foundation::Timestamp;
    use crate::domain::schema;

    fn setup() -> (Arc<InMemoryRecordStore>, StoreAuthAdapter) {
        let store = Arc::new(InMemoryRecordStore::with_collections(schema::collections()));
        let adapter = StoreAuthAdapter::new(store.clone());
        (store, adapter)
    }

    fn token(raw: &str) -> SessionToken {
        SessionToken::new(raw).unwrap()
    }

    #[tokio::test]
    async fn disabled_capability_is_not_advertised_and_skips_store() {
        let (store, adapter) = setup();
        let adapter = adapter.without(Capability::CreateUser);

        assert!(!adapter.capabilities().contains(Capability::CreateUser));
        let result = adapter.create_user(NewUser::new("a@x.com")).await;

        assert!(matches!(
            result,
            Err(AdapterError::Unsupported(Capability::CreateUser))
        ));
        assert_eq!(store.record_count(users::COLLECTION).await, 0);
    }

    #[tokio::test]
    async fn update_session_with_empty_patch_returns_current() {
        let (_, adapter) = setup();
        let user = adapter.create_user(NewUser::new("a@x.com")).await.unwrap();
        let expires = Timestamp::from_unix_secs(1_900_000_000);
        adapter
            .create_session(Session::new(token("t1"), user.id.clone(), expires))
            .await
            .unwrap();

        let session = adapter
            .update_session(SessionUpdate::new(token("t1")))
            .await
            .unwrap();
        assert_eq!(session.expires, expires);
        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn update_missing_session_is_not_found() {
        let (_, adapter) = setup();
        let result = adapter
            .update_session(SessionUpdate::new(token("missing")))
            .await;
        assert!(matches!(result, Err(AdapterError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_missing_session_returns_none() {
        let (_, adapter) = setup();
        assert!(adapter.delete_session(&token("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_user_leaves_dependents() {
        let (store, adapter) = setup();
        let user = adapter.create_user(NewUser::new("a@x.com")).await.unwrap();
        adapter
            .link_account(Account::new(user.id.clone(), AccountType::Oauth, "github", "1"))
            .await
            .unwrap();

        let deleted = adapter.delete_user(&user.id).await.unwrap();
        assert_eq!(deleted, Some(user));
        assert_eq!(store.record_count(accounts::COLLECTION).await, 1);
        assert!(adapter
            .get_user_by_account(&AccountKey::new("github", "1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unlink_orphaned_account_cleans_up_and_reports_not_found() {
        let (store, adapter) = setup();
        let user = adapter.create_user(NewUser::new("a@x.com")).await.unwrap();
        let key = AccountKey::new("github", "1");
        adapter
            .link_account(Account::new(user.id.clone(), AccountType::Oauth, "github", "1"))
            .await
            .unwrap();
        adapter.delete_user(&user.id).await.unwrap();

        let result = adapter.unlink_account(&key).await;
        assert!(matches!(result, Err(AdapterError::NotFound { .. })));
        assert_eq!(store.record_count(accounts::COLLECTION).await, 0);

        let other = adapter.create_user(NewUser::new("b@x.com")).await.unwrap();
        adapter
            .link_account(Account::new(other.id.clone(), AccountType::Oauth, "github", "1"))
            .await
            .unwrap();
        assert_eq!(adapter.get_user_by_account(&key).await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn adapter_is_shareable_as_trait_object() {
        let (_, adapter) = setup();
        let shared: Arc<dyn AuthAdapter> = Arc::new(adapter);
        assert!(shared.get_user_by_email("nobody@x.com").await.unwrap().is_none());
    }
}
