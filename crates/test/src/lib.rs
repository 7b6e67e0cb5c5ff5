//! Test helpers and fixtures.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use bookclub_core::{
    BackendError, BackendResult, BookRecord, BookSearch, CatalogBackend, ClubRecord,
    NewRemoteReadingState, RemoteReadingState, RemoteReadingStatePatch, ReviewRecord,
    ReadingStateBackend, Session, UserBackend, UserRecord, UserRole, VolumeSummary,
};
use bookclub_storage::{LocalReadingStore, MemoryStore};

pub const USER_ID: &str = "u1";

pub fn signed_in() -> Session {
    Session::new(Some("token".to_string()), Some(USER_ID.to_string()))
}

pub fn local_store() -> LocalReadingStore<MemoryStore> {
    LocalReadingStore::new(MemoryStore::new())
}

pub fn remote_state(id: &str, title: &str, status: &str) -> RemoteReadingState {
    RemoteReadingState {
        id: Some(id.to_string()),
        user_id: Some(USER_ID.to_string()),
        title: Some(title.to_string()),
        status: Some(status.to_string()),
        ..RemoteReadingState::default()
    }
}

pub fn review(title: &str, rating: Option<f64>) -> ReviewRecord {
    ReviewRecord {
        id: None,
        book_id: None,
        book_title: Some(title.to_string()),
        user_id: Some(USER_ID.to_string()),
        rating,
        comment: None,
        created_at: None,
    }
}

pub fn club(name: &str, members: u64, posts: u64, active: bool) -> ClubRecord {
    ClubRecord {
        id: None,
        name: name.to_string(),
        member_count: members,
        debate_message_count: posts,
        active,
    }
}

pub fn book(id: &str, title: &str, status: &str) -> BookRecord {
    BookRecord {
        id: Some(id.to_string()),
        google_id: None,
        title: title.to_string(),
        authors: Vec::new(),
        isbn: None,
        status: Some(status.to_string()),
    }
}

pub fn user(id: &str, name: &str, active: bool) -> UserRecord {
    UserRecord {
        id: Some(id.to_string()),
        name: name.to_string(),
        email: None,
        role: UserRole::Member,
        active,
    }
}

pub fn volume(google_id: &str, title: &str) -> VolumeSummary {
    VolumeSummary {
        google_id: google_id.to_string(),
        title: title.to_string(),
        authors: Vec::new(),
        isbn_10: None,
        isbn_13: None,
        thumbnail: None,
        published_date: None,
    }
}

/// In-memory club backend. Follows the HTTP client's session rules: list
/// calls without a token return nothing, mutations fail.
#[derive(Debug, Default)]
pub struct FakeBackend {
    states: RefCell<Vec<RemoteReadingState>>,
    users: RefCell<Vec<UserRecord>>,
    pub reviews: Vec<ReviewRecord>,
    pub clubs: Vec<ClubRecord>,
    pub books: Vec<BookRecord>,
    failing: RefCell<HashSet<&'static str>>,
    next_id: Cell<u32>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(self, states: Vec<RemoteReadingState>) -> Self {
        *self.states.borrow_mut() = states;
        self
    }

    pub fn with_users(self, users: Vec<UserRecord>) -> Self {
        *self.users.borrow_mut() = users;
        self
    }

    /// Makes every call to `endpoint` fail with a 500.
    pub fn fail(&self, endpoint: &'static str) {
        self.failing.borrow_mut().insert(endpoint);
    }

    pub fn states(&self) -> Vec<RemoteReadingState> {
        self.states.borrow().clone()
    }

    fn check(&self, endpoint: &'static str) -> BackendResult<()> {
        if self.failing.borrow().contains(endpoint) {
            return Err(BackendError::Status {
                code: 500,
                message: format!("{endpoint} is down"),
            });
        }
        Ok(())
    }

    fn list<T: Clone>(&self, session: &Session, endpoint: &'static str, items: &[T]) -> BackendResult<Vec<T>> {
        self.check(endpoint)?;
        if !session.is_authenticated() {
            return Ok(Vec::new());
        }
        Ok(items.to_vec())
    }

    fn authorize(&self, session: &Session, endpoint: &'static str) -> BackendResult<()> {
        self.check(endpoint)?;
        if session.is_authenticated() {
            Ok(())
        } else {
            Err(BackendError::NotAuthenticated)
        }
    }

    fn not_found(id: &str) -> BackendError {
        BackendError::Status {
            code: 404,
            message: format!("{id} not found"),
        }
    }
}

impl ReadingStateBackend for FakeBackend {
    async fn list_reading_states(
        &self,
        session: &Session,
        user_id: &str,
    ) -> BackendResult<Vec<RemoteReadingState>> {
        let mine: Vec<RemoteReadingState> = self
            .states
            .borrow()
            .iter()
            .filter(|state| state.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        self.list(session, "reading-states", &mine)
    }

    async fn create_reading_state(
        &self,
        session: &Session,
        body: &NewRemoteReadingState,
    ) -> BackendResult<RemoteReadingState> {
        self.authorize(session, "reading-states")?;
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let created = RemoteReadingState {
            id: Some(format!("r{n}")),
            user_id: Some(body.user_id.clone()),
            book_id: body.book_id.clone(),
            google_id: body.google_id.clone(),
            title: Some(body.title.clone()),
            authors: body.authors.clone(),
            status: Some(body.status.as_str().to_string()),
            notes: Some(body.notes.clone()),
            created_at: Some("2024-03-01T00:00:00Z".to_string()),
            updated_at: Some("2024-03-01T00:00:00Z".to_string()),
        };
        self.states.borrow_mut().insert(0, created.clone());
        Ok(created)
    }

    async fn update_reading_state(
        &self,
        session: &Session,
        id: &str,
        patch: &RemoteReadingStatePatch,
    ) -> BackendResult<RemoteReadingState> {
        self.authorize(session, "reading-states")?;
        let mut states = self.states.borrow_mut();
        let state = states
            .iter_mut()
            .find(|state| state.id.as_deref() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        if let Some(status) = patch.status {
            state.status = Some(status.as_str().to_string());
        }
        if let Some(notes) = &patch.notes {
            state.notes = Some(notes.clone());
        }
        Ok(state.clone())
    }

    async fn delete_reading_state(&self, session: &Session, id: &str) -> BackendResult<()> {
        self.authorize(session, "reading-states")?;
        let mut states = self.states.borrow_mut();
        let before = states.len();
        states.retain(|state| state.id.as_deref() != Some(id));
        if states.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

impl CatalogBackend for FakeBackend {
    async fn list_reviews(&self, session: &Session) -> BackendResult<Vec<ReviewRecord>> {
        self.list(session, "reviews", &self.reviews)
    }

    async fn list_clubs(&self, session: &Session) -> BackendResult<Vec<ClubRecord>> {
        self.list(session, "clubs", &self.clubs)
    }

    async fn list_books(&self, session: &Session) -> BackendResult<Vec<BookRecord>> {
        self.list(session, "books", &self.books)
    }
}

impl UserBackend for FakeBackend {
    async fn list_users(&self, session: &Session) -> BackendResult<Vec<UserRecord>> {
        let users = self.users.borrow().clone();
        self.list(session, "users", &users)
    }

    async fn set_user_active(
        &self,
        session: &Session,
        id: &str,
        active: bool,
    ) -> BackendResult<UserRecord> {
        self.authorize(session, "users")?;
        let mut users = self.users.borrow_mut();
        let user = users
            .iter_mut()
            .find(|user| user.id.as_deref() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        user.active = active;
        Ok(user.clone())
    }
}

/// Search provider that answers every query with the same volumes.
#[derive(Debug, Default)]
pub struct FakeSearch {
    pub volumes: Vec<VolumeSummary>,
    pub down: bool,
}

impl BookSearch for FakeSearch {
    async fn search_volumes(&self, query: &str) -> BackendResult<Vec<VolumeSummary>> {
        if self.down {
            return Err(BackendError::Network(format!("search for {query} timed out")));
        }
        Ok(self.volumes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_use_the_signed_in_user() {
        let session = signed_in();
        assert_eq!(session.user_id(), Some(USER_ID));
        assert_eq!(remote_state("r1", "Dune", "read").user_id.as_deref(), Some(USER_ID));
    }

    #[tokio::test]
    async fn fake_backend_hides_lists_without_token() {
        let backend = FakeBackend::new().with_states(vec![remote_state("r1", "Dune", "read")]);
        let anonymous = Session::anonymous();
        assert!(backend
            .list_reading_states(&anonymous, USER_ID)
            .await
            .is_ok_and(|states| states.is_empty()));
        assert!(matches!(
            backend.delete_reading_state(&anonymous, "r1").await,
            Err(BackendError::NotAuthenticated)
        ));
    }
}
