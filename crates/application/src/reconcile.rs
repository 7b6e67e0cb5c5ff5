//! Merging remote and local reading states into one list, and routing edits
//! back to whichever side owns each entry.

use bookclub_core::{
    BackendError, EntryKey, LocalReadingState, NewLocalReadingState, NewRemoteReadingState,
    Origin, ReadingPatch, ReadingStateBackend, ReadingStateEntry, RemoteReadingState,
    RemoteReadingStatePatch, Session,
};
use bookclub_storage::{KeyValueStore, LocalReadingStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::messages;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("entry has no stable key")]
    ReadOnly,

    #[error("reading state {0} not found")]
    NotFound(String),

    #[error("a signed-in user is required")]
    NotAuthenticated,
}

impl AppError {
    /// Message to show for this error; `fallback` covers backend failures
    /// that have no more specific wording.
    pub fn user_message(&self, fallback: &'static str) -> &'static str {
        match self {
            AppError::ReadOnly => messages::ENTRY_READ_ONLY,
            AppError::NotFound(_) => messages::ENTRY_NOT_FOUND,
            AppError::NotAuthenticated | AppError::Backend(BackendError::NotAuthenticated) => {
                messages::SIGN_IN_REQUIRED
            }
            AppError::Backend(err) if err.is_not_found() => messages::ENTRY_NOT_FOUND,
            AppError::Backend(_) => fallback,
        }
    }
}

/// For pages that cannot do anything without a session.
pub fn require_session(session: &Session) -> Result<(), AppError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::NotAuthenticated)
    }
}

/// Local entries first, then remote, each side in its own order. Statuses
/// are folded into UI vocabulary. No deduplication between the two sides.
pub fn merge(
    local: Vec<LocalReadingState>,
    remote: Vec<RemoteReadingState>,
) -> Vec<ReadingStateEntry> {
    local
        .into_iter()
        .map(ReadingStateEntry::from_local)
        .chain(remote.into_iter().map(ReadingStateEntry::from_remote))
        .collect()
}

/// Resolves a user-typed key against a merged list: id first, then book id,
/// then external (google) id.
pub fn find<'e>(entries: &'e [ReadingStateEntry], key: &str) -> Option<&'e ReadingStateEntry> {
    let key = key.trim();
    entries
        .iter()
        .find(|entry| entry.id.as_deref() == Some(key))
        .or_else(|| {
            entries
                .iter()
                .find(|entry| entry.book_id.as_deref() == Some(key))
        })
        .or_else(|| {
            entries
                .iter()
                .find(|entry| entry.google_id.as_deref() == Some(key))
        })
}

/// A reconciled list. `remote_error` is set when only the local side loaded.
#[derive(Debug, Default)]
pub struct LoadedStates {
    pub entries: Vec<ReadingStateEntry>,
    pub remote_error: Option<BackendError>,
}

impl LoadedStates {
    pub fn is_partial(&self) -> bool {
        self.remote_error.is_some()
    }

    /// Fails only when the remote side failed and nothing local is left to show.
    pub fn into_entries(self) -> Result<Vec<ReadingStateEntry>, BackendError> {
        match self.remote_error {
            Some(err) if self.entries.is_empty() => Err(err),
            _ => Ok(self.entries),
        }
    }
}

pub struct Reconciler<'a, B, S> {
    backend: &'a B,
    local: &'a LocalReadingStore<S>,
    session: &'a Session,
}

impl<'a, B, S> Reconciler<'a, B, S>
where
    B: ReadingStateBackend,
    S: KeyValueStore,
{
    pub fn new(backend: &'a B, local: &'a LocalReadingStore<S>, session: &'a Session) -> Self {
        Self {
            backend,
            local,
            session,
        }
    }

    /// Local entries are returned even when the remote fetch fails.
    pub async fn load(&self, user_id: &str) -> LoadedStates {
        let local = self.local.list(user_id);
        let (remote, remote_error) = match self
            .backend
            .list_reading_states(self.session, user_id)
            .await
        {
            Ok(remote) => (remote, None),
            Err(err) => {
                warn!(user_id, "remote reading states failed: {err}");
                (Vec::new(), Some(err))
            }
        };
        debug!(
            user_id,
            local = local.len(),
            remote = remote.len(),
            "reconciled reading states"
        );
        LoadedStates {
            entries: merge(local, remote),
            remote_error,
        }
    }

    pub fn add_local(&self, user_id: &str, draft: NewLocalReadingState) -> ReadingStateEntry {
        ReadingStateEntry::from_local(self.local.add(user_id, draft))
    }

    pub async fn update(
        &self,
        entry: &ReadingStateEntry,
        patch: &ReadingPatch,
    ) -> Result<ReadingStateEntry, AppError> {
        let key = entry.key();
        let Some(key_str) = key.as_str() else {
            return Err(AppError::ReadOnly);
        };

        match entry.origin {
            Origin::Local => {
                let EntryKey::Id(id) = &key else {
                    return Err(AppError::NotFound(key_str.to_string()));
                };
                let user_id = self.owner_of(entry)?;
                let updated = self
                    .local
                    .update(user_id, id, patch)
                    .ok_or_else(|| AppError::NotFound(id.clone()))?;
                Ok(ReadingStateEntry::from_local(updated))
            }
            Origin::Remote => {
                let body = RemoteReadingStatePatch::from(patch);
                let mut updated = self
                    .backend
                    .update_reading_state(self.session, key_str, &body)
                    .await?;
                fill_from(&mut updated, entry);
                Ok(ReadingStateEntry::from_remote(updated))
            }
        }
    }

    pub async fn delete(&self, entry: &ReadingStateEntry) -> Result<(), AppError> {
        let key = entry.key();
        let Some(key_str) = key.as_str() else {
            return Err(AppError::ReadOnly);
        };

        match entry.origin {
            Origin::Local => {
                let user_id = self.owner_of(entry)?;
                self.local.delete(user_id, key_str);
            }
            Origin::Remote => {
                self.backend
                    .delete_reading_state(self.session, key_str)
                    .await?;
            }
        }
        Ok(())
    }

    /// Pushes a local entry to the backend and drops the local copy once the
    /// backend has accepted it.
    pub async fn import_local(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<ReadingStateEntry, AppError> {
        require_session(self.session)?;
        let local = self
            .local
            .get(user_id, id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        let body = NewRemoteReadingState::from_local(&local);
        let mut created = self
            .backend
            .create_reading_state(self.session, &body)
            .await?;
        self.local.delete(user_id, id);
        info!(user_id, local_id = id, remote_id = ?created.id, "imported local reading state");

        if created.title.is_none() {
            created.title = Some(local.title);
        }
        if created.authors.is_empty() {
            created.authors = local.authors;
        }
        Ok(ReadingStateEntry::from_remote(created))
    }

    fn owner_of<'e>(&self, entry: &'e ReadingStateEntry) -> Result<&'e str, AppError>
    where
        'a: 'e,
    {
        entry
            .user_id
            .as_deref()
            .or(self.session.user_id())
            .ok_or(AppError::NotAuthenticated)
    }
}

/// Backends often answer a PATCH with only the changed fields.
fn fill_from(updated: &mut RemoteReadingState, original: &ReadingStateEntry) {
    if updated.id.is_none() {
        updated.id = original.id.clone();
    }
    if updated.user_id.is_none() {
        updated.user_id = original.user_id.clone();
    }
    if updated.book_id.is_none() {
        updated.book_id = original.book_id.clone();
    }
    if updated.google_id.is_none() {
        updated.google_id = original.google_id.clone();
    }
    if updated.title.is_none() {
        updated.title = Some(original.title.clone());
    }
    if updated.authors.is_empty() {
        updated.authors = original.authors.clone();
    }
    if updated.status.is_none() {
        updated.status = Some(original.status.as_str().to_string());
    }
    if updated.notes.is_none() {
        updated.notes = original.notes.clone();
    }
    if updated.created_at.is_none() {
        updated.created_at = original.created_at.clone();
    }
}
