//! Ports to the backend. The `api` crate implements them over HTTP; tests
//! implement them in memory.

use thiserror::Error;

use crate::Session;
use crate::reading::{NewRemoteReadingState, RemoteReadingState, RemoteReadingStatePatch};
use crate::records::{BookRecord, ClubRecord, ReviewRecord, UserRecord, VolumeSummary};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { code: 404, .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Reading-state endpoints. List calls without a session token return no
/// data; mutations return [`BackendError::NotAuthenticated`].
#[allow(async_fn_in_trait)]
pub trait ReadingStateBackend {
    async fn list_reading_states(
        &self,
        session: &Session,
        user_id: &str,
    ) -> BackendResult<Vec<RemoteReadingState>>;

    async fn create_reading_state(
        &self,
        session: &Session,
        body: &NewRemoteReadingState,
    ) -> BackendResult<RemoteReadingState>;

    async fn update_reading_state(
        &self,
        session: &Session,
        id: &str,
        patch: &RemoteReadingStatePatch,
    ) -> BackendResult<RemoteReadingState>;

    async fn delete_reading_state(&self, session: &Session, id: &str) -> BackendResult<()>;
}

#[allow(async_fn_in_trait)]
pub trait CatalogBackend {
    async fn list_reviews(&self, session: &Session) -> BackendResult<Vec<ReviewRecord>>;
    async fn list_clubs(&self, session: &Session) -> BackendResult<Vec<ClubRecord>>;
    async fn list_books(&self, session: &Session) -> BackendResult<Vec<BookRecord>>;
}

#[allow(async_fn_in_trait)]
pub trait UserBackend {
    async fn list_users(&self, session: &Session) -> BackendResult<Vec<UserRecord>>;
    async fn set_user_active(
        &self,
        session: &Session,
        id: &str,
        active: bool,
    ) -> BackendResult<UserRecord>;
}

/// External book-search provider.
#[allow(async_fn_in_trait)]
pub trait BookSearch {
    async fn search_volumes(&self, query: &str) -> BackendResult<Vec<VolumeSummary>>;
}
