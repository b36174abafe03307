//! PocketBase REST client.
//!
//! Implements `RecordStore` and `SchemaImporter` against a PocketBase
//! instance's collection and record endpoints.
//!
//! # Security
//!
//! - All calls run as a superuser; the token is obtained by `authenticate`
//!   and held as a `secrecy::SecretString`
//! - Neither the password nor the token is ever logged
//! - The token is never refreshed; re-run `authenticate` after a 401
//! - Filter values containing a backslash are never sent to the server
//!
//! # Configuration
//!
//! ```ignore
//! let config = PocketBaseConfig::new(Url::parse("http://127.0.0.1:8090")?);
//! let client = PocketBaseClient::new(config);
//! client.authenticate("admin@example.com", "password").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::filter::render_partial;
use crate::domain::schema::CollectionDefinition;
use crate::ports::{
    Filter, RecordData, RecordStore, SchemaImporter, StoreError, StoreErrorCode, StoreRecord,
};

/// Page size used when fetching full lists.
const FULL_LIST_PAGE_SIZE: usize = 500;

/// Default superuser collection (PocketBase 0.23+).
pub const DEFAULT_ADMIN_COLLECTION: &str = "_superusers";

/// PocketBase connection configuration.
#[derive(Debug, Clone)]
pub struct PocketBaseConfig {
    /// Base URL of the instance, e.g. `https://pb.example.com`.
    base_url: Url,

    /// Collection the superuser authenticates against.
    admin_collection: String,

    /// Per-request timeout.
    request_timeout: Duration,
}

impl PocketBaseConfig {
    /// Create a configuration with the default admin collection and a 10s timeout.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            admin_collection: DEFAULT_ADMIN_COLLECTION.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_admin_collection(mut self, collection: impl Into<String>) -> Self {
        self.admin_collection = collection.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended as percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn records_url(&self, collection: &str) -> Url {
        self.endpoint(&["api", "collections", collection, "records"])
    }

    fn record_url(&self, collection: &str, id: &str) -> Url {
        self.endpoint(&["api", "collections", collection, "records", id])
    }

    fn auth_url(&self) -> Url {
        self.endpoint(&["api", "collections", &self.admin_collection, "auth-with-password"])
    }

    fn import_url(&self) -> Url {
        self.endpoint(&["api", "collections", "import"])
    }
}

/// Error body returned by PocketBase for non-2xx responses. Older releases
/// report the status as `code`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    items: Vec<StoreRecord>,
}

/// Maps a non-success response to a `StoreError`, keeping the body's
/// message and per-field `data` unmodified.
pub(crate) fn error_from_response(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let message = if parsed.message.is_empty() {
                format!("PocketBase returned {}", status)
            } else {
                parsed.message
            };
            let data = match parsed.data {
                Value::Null => json!({}),
                other => other,
            };
            let status = parsed.status.or(parsed.code).unwrap_or(status);
            StoreError::from_status(status, message, data)
        }
        Err(_) => {
            let message = if body.trim().is_empty() {
                format!("PocketBase returned {}", status)
            } else {
                body.trim().to_string()
            };
            StoreError::from_status(status, message, json!({}))
        }
    }
}

/// PocketBase-backed record store.
///
/// The superuser token is not refreshed. Once it expires every call fails
/// with `StoreErrorCode::Unauthorized` until `authenticate` is called again.
pub struct PocketBaseClient {
    config: PocketBaseConfig,
    http_client: reqwest::Client,
    token: RwLock<Option<SecretString>>,
}

impl PocketBaseClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(config: PocketBaseConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
            token: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PocketBaseConfig {
        &self.config
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Attaches the superuser token (when present), sends, and maps any
    /// non-success status to a `StoreError`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match self.token.read().await.as_ref() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token.expose_secret()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "PocketBase request failed");
            StoreError::network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_from_response(status.as_u16(), &body);
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(status = status.as_u16(), "PocketBase resource not found");
        } else {
            tracing::warn!(
                status = status.as_u16(),
                error = %err,
                data = %err.data,
                "PocketBase request rejected"
            );
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse PocketBase response");
            StoreError::decode(format!("Failed to parse PocketBase response: {}", e))
        })
    }

    /// One page of records matching `expression`; an empty expression
    /// matches everything.
    async fn fetch_page(
        &self,
        collection: &str,
        expression: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
            ("skipTotal", "1".to_string()),
        ];
        if !expression.is_empty() {
            query.push(("filter", expression.to_string()));
        }

        let request = self
            .http_client
            .get(self.config.records_url(collection))
            .query(&query);
        let response = self.execute(request).await?;
        let list: ListResponse = Self::decode(response).await?;
        Ok(list.items)
    }

    async fn fetch_all(
        &self,
        collection: &str,
        expression: &str,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let items = self
                .fetch_page(collection, expression, page, FULL_LIST_PAGE_SIZE)
                .await?;
            let done = items.len() < FULL_LIST_PAGE_SIZE;
            records.extend(items);
            if done {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    /// Records matching `expression` and `rest`. `rest` holds the conditions
    /// that cannot be sent to PocketBase; they are checked here against the
    /// rows `expression` returns. An empty `expression` is a miss and no
    /// request is made.
    async fn fetch_matching(
        &self,
        collection: &str,
        expression: &str,
        rest: &Filter,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        if expression.is_empty() {
            tracing::debug!(collection, "Filter has no server-side condition, treating as a miss");
            return Ok(Vec::new());
        }

        let mut records = self.fetch_all(collection, expression).await?;
        records.retain(|record| rest.matches(record));
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    async fn authenticate(&self, identity: &str, password: &str) -> Result<(), StoreError> {
        tracing::debug!(
            collection = %self.config.admin_collection,
            "Authenticating PocketBase superuser"
        );

        let request = self
            .http_client
            .post(self.config.auth_url())
            .json(&json!({ "identity": identity, "password": password }));

        let response = self.execute(request).await.map_err(|e| {
            tracing::error!(error = %e, "PocketBase superuser authentication failed");
            e
        })?;
        let auth: AuthResponse = Self::decode(response).await?;

        *self.token.write().await = Some(SecretString::new(auth.token));
        tracing::info!("Authenticated against PocketBase");
        Ok(())
    }

    async fn create(&self, collection: &str, data: RecordData) -> Result<StoreRecord, StoreError> {
        tracing::debug!(collection, "Creating record");

        let request = self
            .http_client
            .post(self.config.records_url(collection))
            .json(&data);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        tracing::debug!(collection, id, "Fetching record");

        let request = self.http_client.get(self.config.record_url(collection, id));
        match self.execute(request).await {
            Ok(response) => Self::decode(response).await.map(Some),
            Err(e) if e.code == StoreErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_first_list_item(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<StoreRecord>, StoreError> {
        let (expression, rest) = render_partial(filter);
        tracing::debug!(collection, filter = %expression, "Fetching first match");

        if rest.is_empty() {
            let items = self.fetch_page(collection, &expression, 1, 1).await?;
            return Ok(items.into_iter().next());
        }
        let items = self.fetch_matching(collection, &expression, &rest).await?;
        Ok(items.into_iter().next())
    }

    async fn get_full_list(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let (expression, rest) = render_partial(filter);
        tracing::debug!(collection, filter = %expression, "Fetching full list");

        if rest.is_empty() {
            return self.fetch_all(collection, &expression).await;
        }
        self.fetch_matching(collection, &expression, &rest).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: RecordData,
    ) -> Result<StoreRecord, StoreError> {
        tracing::debug!(collection, id, columns = patch.len(), "Updating record");

        let request = self
            .http_client
            .patch(self.config.record_url(collection, id))
            .json(&patch);
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        tracing::debug!(collection, id, "Deleting record");

        let request = self.http_client.delete(self.config.record_url(collection, id));
        self.execute(request).await?;
        Ok(())
    }
}

#[async_trait]
impl SchemaImporter for PocketBaseClient {
    async fn import_collections(&self, collections: &[CollectionDefinition]) -> Result<(), StoreError> {
        tracing::info!(count = collections.len(), "Importing collections");

        let request = self
            .http_client
            .put(self.config.import_url())
            .json(&json!({ "collections": collections, "deleteMissing": false }));
        self.execute(request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for PocketBaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("admin_collection", &self.config.admin_collection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::VALIDATION_NOT_UNIQUE;

    fn config() -> PocketBaseConfig {
        PocketBaseConfig::new(Url::parse("http://127.0.0.1:8090").unwrap())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Endpoint Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn builds_record_endpoints() {
        let config = config();
        assert_eq!(
            config.records_url("users").as_str(),
            "http://127.0.0.1:8090/api/collections/users/records"
        );
        assert_eq!(
            config.record_url("users", "abc123").as_str(),
            "http://127.0.0.1:8090/api/collections/users/records/abc123"
        );
    }

    #[test]
    fn handles_base_url_with_path_and_trailing_slash() {
        let config = PocketBaseConfig::new(Url::parse("https://example.com/pb/").unwrap());
        assert_eq!(
            config.import_url().as_str(),
            "https://example.com/pb/api/collections/import"
        );
    }

    #[test]
    fn percent_encodes_record_ids() {
        let url = config().record_url("users", "a/b c");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8090/api/collections/users/records/a%2Fb%20c"
        );
    }

    #[test]
    fn auth_endpoint_uses_admin_collection() {
        let config = config().with_admin_collection("_admins");
        assert_eq!(
            config.auth_url().as_str(),
            "http://127.0.0.1:8090/api/collections/_admins/auth-with-password"
        );
    }

    #[test]
    fn defaults_to_superusers_and_ten_second_timeout() {
        let config = config();
        assert_eq!(config.admin_collection, "_superusers");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn maps_uniqueness_error_body() {
        let body = r#"{
            "status": 400,
            "message": "Failed to create record.",
            "data": {
                "user_email": {
                    "code": "validation_not_unique",
                    "message": "Value must be unique."
                }
            }
        }"#;

        let err = error_from_response(400, body);
        assert_eq!(err.code, StoreErrorCode::Validation);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "Failed to create record.");
        assert_eq!(err.data["user_email"]["code"], VALIDATION_NOT_UNIQUE);
        assert!(err.is_not_unique());
    }

    #[test]
    fn accepts_code_in_place_of_status() {
        let body = r#"{"code": 404, "message": "The requested resource wasn't found.", "data": {}}"#;
        let err = error_from_response(404, body);
        assert_eq!(err.code, StoreErrorCode::NotFound);
        assert_eq!(err.status, Some(404));
    }

    #[test]
    fn non_json_body_becomes_message() {
        let err = error_from_response(502, "Bad Gateway");
        assert_eq!(err.code, StoreErrorCode::Server);
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.data, json!({}));
    }

    #[test]
    fn empty_body_gets_status_message() {
        let err = error_from_response(401, "");
        assert_eq!(err.code, StoreErrorCode::Unauthorized);
        assert_eq!(err.message, "PocketBase returned 401");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Type Safety Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PocketBaseClient>();
    }

    #[tokio::test]
    async fn client_starts_unauthenticated() {
        let client = PocketBaseClient::new(config());
        assert!(!client.is_authenticated().await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Filter Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn backslash_only_filter_is_a_miss_without_a_request() {
        // Nothing listens on this port; a request would fail with a network error.
        let client = PocketBaseClient::new(PocketBaseConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
        ));
        let filter = Filter::eq("user_email", "a\\");

        assert_eq!(client.get_first_list_item("users", &filter).await.unwrap(), None);
        assert!(client.get_full_list("users", &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mixed_filter_still_queries_the_server() {
        let client = PocketBaseClient::new(
            PocketBaseConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
                .with_request_timeout(Duration::from_secs(1)),
        );
        let filter = Filter::eq("verification_token_identifier", "a\\")
            .and_eq("verification_token_token", "t");

        let err = client
            .get_first_list_item("verification_tokens", &filter)
            .await
            .unwrap_err();
        assert_eq!(err.code, StoreErrorCode::Network);
    }

    #[test]
    fn debug_output_omits_token() {
        let client = PocketBaseClient::new(config());
        let debug = format!("{:?}", client);
        assert!(debug.contains("127.0.0.1:8090"));
        assert!(!debug.contains("token"));
    }
}
