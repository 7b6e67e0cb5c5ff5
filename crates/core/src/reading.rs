//! Reading-state records, both the locally persisted kind and the kind the
//! backend owns, plus the merged entry shown to readers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{field, id_field, str_field, string_list};
use crate::status::{ApiStatus, UiStatus, deserialize_lenient, to_ui_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Remote,
    Local,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Remote => "remote",
            Origin::Local => "local",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reading entry persisted on this machine only. Status is stored in UI
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalReadingState {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "deserialize_lenient", default = "default_status")]
    pub status: UiStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_status() -> UiStatus {
    UiStatus::ToRead
}

/// Input for a new local entry; ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocalReadingState {
    pub google_id: Option<String>,
    pub book_id: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub status: UiStatus,
    pub notes: String,
    pub thumbnail: Option<String>,
}

impl NewLocalReadingState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            google_id: None,
            book_id: None,
            title: title.into(),
            authors: Vec::new(),
            status: UiStatus::ToRead,
            notes: String::new(),
            thumbnail: None,
        }
    }
}

/// Partial edit applied to an entry. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingPatch {
    pub status: Option<UiStatus>,
    pub notes: Option<String>,
}

impl ReadingPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

/// A backend reading state after field aliases are resolved. `status` is kept
/// raw; the reconciler folds it into UI vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteReadingState {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub google_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl RemoteReadingState {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let book = ["book", "bookId"]
            .iter()
            .filter_map(|name| obj.get(*name))
            .find_map(Value::as_object);

        let title = str_field(obj, &["title", "bookTitle"])
            .or_else(|| book.and_then(|book| str_field(book, &["title"])));
        let mut authors = string_list(field(obj, &["authors"]));
        if authors.is_empty() {
            if let Some(book) = book {
                authors = string_list(field(book, &["authors", "author"]));
            }
        }
        let google_id = str_field(obj, &["googleId", "google_id"])
            .or_else(|| book.and_then(|book| str_field(book, &["googleId"])));

        Some(Self {
            id: id_field(obj, &["id", "_id"]),
            user_id: id_field(obj, &["userId", "user"]),
            book_id: id_field(obj, &["bookId", "book"]),
            google_id,
            title,
            authors,
            status: str_field(obj, &["status", "state"]),
            notes: str_field(obj, &["notes", "note", "comment"]),
            created_at: str_field(obj, &["createdAt", "created_at"]),
            updated_at: str_field(obj, &["updatedAt", "updated_at"]),
        })
    }
}

/// Body for `POST /reading-states`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteReadingState {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub status: ApiStatus,
    pub notes: String,
}

impl NewRemoteReadingState {
    pub fn from_local(local: &LocalReadingState) -> Self {
        Self {
            user_id: local.user_id.clone(),
            book_id: local.book_id.clone(),
            google_id: local.google_id.clone(),
            title: local.title.clone(),
            authors: local.authors.clone(),
            status: local.status.into(),
            notes: local.notes.clone(),
        }
    }
}

/// Body for `PATCH /reading-states/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteReadingStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApiStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&ReadingPatch> for RemoteReadingStatePatch {
    fn from(patch: &ReadingPatch) -> Self {
        Self {
            status: patch.status.map(ApiStatus::from),
            notes: patch.notes.clone(),
        }
    }
}

/// How an entry can be addressed for edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Id(String),
    BookId(String),
    /// No stable key; the entry is shown read-only.
    Unkeyed,
}

impl EntryKey {
    pub fn is_editable(&self) -> bool {
        !matches!(self, EntryKey::Unkeyed)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryKey::Id(id) | EntryKey::BookId(id) => Some(id),
            EntryKey::Unkeyed => None,
        }
    }
}

/// One row of the merged reading list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStateEntry {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub google_id: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub status: UiStatus,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub origin: Origin,
}

impl ReadingStateEntry {
    pub fn from_local(local: LocalReadingState) -> Self {
        Self {
            id: Some(local.id),
            user_id: Some(local.user_id),
            book_id: local.book_id,
            google_id: local.google_id,
            title: local.title,
            authors: local.authors,
            status: local.status,
            notes: (!local.notes.is_empty()).then_some(local.notes),
            created_at: (!local.created_at.is_empty()).then_some(local.created_at),
            updated_at: (!local.updated_at.is_empty()).then_some(local.updated_at),
            origin: Origin::Local,
        }
    }

    pub fn from_remote(remote: RemoteReadingState) -> Self {
        let title = remote.title.unwrap_or_else(|| match &remote.book_id {
            Some(id) => format!("Book #{id}"),
            None => "Untitled".to_string(),
        });
        Self {
            id: remote.id,
            user_id: remote.user_id,
            book_id: remote.book_id,
            google_id: remote.google_id,
            title,
            authors: remote.authors,
            status: to_ui_status(remote.status.as_deref()),
            notes: remote.notes,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
            origin: Origin::Remote,
        }
    }

    pub fn key(&self) -> EntryKey {
        if let Some(id) = &self.id {
            EntryKey::Id(id.clone())
        } else if let Some(book_id) = &self.book_id {
            EntryKey::BookId(book_id.clone())
        } else {
            EntryKey::Unkeyed
        }
    }

    /// `updated_at`, falling back to `created_at`.
    pub fn last_touched(&self) -> Option<&str> {
        self.updated_at.as_deref().or(self.created_at.as_deref())
    }
}
