//! HTTP clients for the book-club backend and the external book search.

mod search;

use std::time::Duration;

use bookclub_core::{
    BackendError, BackendResult, BookRecord, CatalogBackend, ClubRecord, NewRemoteReadingState,
    ReadingStateBackend, RemoteReadingState, RemoteReadingStatePatch, ReviewRecord, Session,
    Settings, UserBackend, UserRecord,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub use search::{BookSearchClient, build_search_query};

const USER_AGENT: &str = concat!("bookclub/", env!("CARGO_PKG_VERSION"));

/// Client for the backend REST API. Every call takes the caller's
/// [`Session`]; the client itself holds no credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> BackendResult<Self> {
        Self::with_base_url(
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, "backend request");
        self.http.request(method, url).bearer_auth(token)
    }

    /// Fetches a collection. No token means no data, not an error.
    async fn list<T>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, &str)],
        adapt: fn(&Value) -> Option<T>,
    ) -> BackendResult<Vec<T>> {
        let Some(token) = session.token() else {
            debug!(path, "no session token, skipping fetch");
            return Ok(Vec::new());
        };
        let response = self
            .request(Method::GET, path, token)
            .query(query)
            .send()
            .await
            .map_err(network_error)?;
        let body = read_json(response).await?;
        Ok(collection_items(body).iter().filter_map(adapt).collect())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> BackendResult<Value> {
        let token = session.token().ok_or(BackendError::NotAuthenticated)?;
        let mut request = self.request(method, path, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(network_error)?;
        read_json(response).await
    }
}

pub(crate) fn http_client(timeout: Duration) -> BackendResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(network_error)
}

pub(crate) fn network_error(err: reqwest::Error) -> BackendError {
    BackendError::Network(err.to_string())
}

/// Reads a JSON body, mapping non-2xx statuses to [`BackendError`]. Empty
/// bodies (204, or a bare 200) read as `null`.
pub(crate) async fn read_json(response: Response) -> BackendResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(network_error)?;

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(BackendError::NotAuthenticated);
    }
    if !status.is_success() {
        return Err(BackendError::Status {
            code: status.as_u16(),
            message: error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|err| BackendError::Decode(err.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(obj)) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => Some(trimmed.to_string()),
    }
}

/// Accepts a bare array or an envelope such as `{ "data": [...] }`.
pub fn collection_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => ["data", "items", "results"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                Some(Value::Object(inner)) => Some(collection_items(Value::Object(inner))),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Unwraps `{ "data": {...} }` around a single record.
pub fn single_item(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_object) => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode_one<T>(body: Value, adapt: fn(&Value) -> Option<T>, what: &str) -> BackendResult<T> {
    adapt(&single_item(body)).ok_or_else(|| BackendError::Decode(format!("expected {what} object")))
}

impl ReadingStateBackend for ApiClient {
    async fn list_reading_states(
        &self,
        session: &Session,
        user_id: &str,
    ) -> BackendResult<Vec<RemoteReadingState>> {
        self.list(
            session,
            "reading-states",
            &[("userId", user_id)],
            RemoteReadingState::from_json,
        )
        .await
    }

    async fn create_reading_state(
        &self,
        session: &Session,
        body: &NewRemoteReadingState,
    ) -> BackendResult<RemoteReadingState> {
        let body = self
            .send(session, Method::POST, "reading-states", Some(body))
            .await?;
        decode_one(body, RemoteReadingState::from_json, "reading state")
    }

    async fn update_reading_state(
        &self,
        session: &Session,
        id: &str,
        patch: &RemoteReadingStatePatch,
    ) -> BackendResult<RemoteReadingState> {
        let body = self
            .send(
                session,
                Method::PATCH,
                &format!("reading-states/{id}"),
                Some(patch),
            )
            .await?;
        decode_one(body, RemoteReadingState::from_json, "reading state")
    }

    async fn delete_reading_state(&self, session: &Session, id: &str) -> BackendResult<()> {
        self.send::<Value>(
            session,
            Method::DELETE,
            &format!("reading-states/{id}"),
            None,
        )
        .await?;
        Ok(())
    }
}

impl CatalogBackend for ApiClient {
    async fn list_reviews(&self, session: &Session) -> BackendResult<Vec<ReviewRecord>> {
        self.list(session, "reviews", &[], ReviewRecord::from_json)
            .await
    }

    async fn list_clubs(&self, session: &Session) -> BackendResult<Vec<ClubRecord>> {
        self.list(session, "clubs", &[], ClubRecord::from_json).await
    }

    async fn list_books(&self, session: &Session) -> BackendResult<Vec<BookRecord>> {
        self.list(session, "books", &[], BookRecord::from_json).await
    }
}

impl UserBackend for ApiClient {
    async fn list_users(&self, session: &Session) -> BackendResult<Vec<UserRecord>> {
        self.list(session, "users", &[], UserRecord::from_json).await
    }

    async fn set_user_active(
        &self,
        session: &Session,
        id: &str,
        active: bool,
    ) -> BackendResult<UserRecord> {
        let body = serde_json::json!({ "active": active });
        let body = self
            .send(session, Method::PATCH, &format!("users/{id}"), Some(&body))
            .await?;
        decode_one(body, UserRecord::from_json, "user")
    }
}
