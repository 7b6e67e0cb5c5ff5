//! Reading states kept on this machine for books the backend has not
//! imported yet.
//!
//! All users share one blob under [`LOCAL_READING_STATES_KEY`]: a JSON map of
//! `user id -> [LocalReadingState]`, newest first. The store never reports
//! failures to its caller. An unparsable blob reads as empty, and with no
//! backend attached every write is dropped.
//!
//! Records are decoded one at a time. A record that does not decode is
//! skipped on read but written back unchanged, so one odd entry never costs
//! another entry or another user its data.

use bookclub_core::{LocalReadingState, NewLocalReadingState, ReadingPatch};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::KeyValueStore;

pub const LOCAL_READING_STATES_KEY: &str = "bookclub.localReadingStates";

type Collection = Map<String, Value>;

#[derive(Debug)]
pub struct LocalReadingStore<S> {
    backend: Option<S>,
}

impl<S: KeyValueStore> LocalReadingStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store with nowhere to persist: reads are empty, writes vanish.
    pub fn detached() -> Self {
        Self { backend: None }
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    pub fn list(&self, user_id: &str) -> Vec<LocalReadingState> {
        let all = self.read_all();
        records(&all, user_id)
            .iter()
            .filter_map(|raw| decode(user_id, raw))
            .collect()
    }

    pub fn get(&self, user_id: &str, id: &str) -> Option<LocalReadingState> {
        self.list(user_id).into_iter().find(|entry| entry.id == id)
    }

    pub fn add(&self, user_id: &str, draft: NewLocalReadingState) -> LocalReadingState {
        let now = now();
        let entry = LocalReadingState {
            id: format!("local-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            google_id: draft.google_id,
            book_id: draft.book_id,
            title: draft.title,
            authors: draft.authors,
            status: draft.status,
            notes: draft.notes,
            thumbnail: draft.thumbnail,
            created_at: now.clone(),
            updated_at: now,
        };
        let Some(raw) = encode(&entry) else {
            return entry;
        };

        let mut all = self.read_all();
        let slot = all
            .entry(user_id)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            warn!(user_id, "replacing malformed local reading state list");
            *slot = Value::Array(Vec::new());
        }
        if let Some(records) = slot.as_array_mut() {
            records.insert(0, raw);
        }
        self.write_all(&all);
        debug!(user_id, id = %entry.id, "added local reading state");
        entry
    }

    pub fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &ReadingPatch,
    ) -> Option<LocalReadingState> {
        let mut all = self.read_all();
        let slot = all
            .get_mut(user_id)
            .and_then(Value::as_array_mut)?
            .iter_mut()
            .find(|raw| raw_id(raw) == Some(id))?;
        let mut entry = decode(user_id, slot)?;

        if let Some(status) = patch.status {
            entry.status = status;
        }
        if let Some(notes) = &patch.notes {
            entry.notes = notes.clone();
        }
        entry.updated_at = now();
        *slot = encode(&entry)?;

        self.write_all(&all);
        Some(entry)
    }

    pub fn delete(&self, user_id: &str, id: &str) {
        let mut all = self.read_all();
        let Some(records) = all.get_mut(user_id).and_then(Value::as_array_mut) else {
            return;
        };
        let before = records.len();
        records.retain(|raw| raw_id(raw) != Some(id));
        if records.len() == before {
            return;
        }
        if records.is_empty() {
            all.remove(user_id);
        }
        self.write_all(&all);
    }

    fn read_all(&self) -> Collection {
        let Some(backend) = &self.backend else {
            return Collection::new();
        };
        let raw = match backend.get_item(LOCAL_READING_STATES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Collection::new(),
            Err(err) => {
                warn!("local reading states unavailable: {err:#}");
                return Collection::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!("discarding unreadable local reading states: {err}");
            Collection::new()
        })
    }

    fn write_all(&self, all: &Collection) {
        let Some(backend) = &self.backend else {
            return;
        };
        let raw = match serde_json::to_string(all) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("could not encode local reading states: {err}");
                return;
            }
        };
        if let Err(err) = backend.set_item(LOCAL_READING_STATES_KEY, &raw) {
            warn!("could not persist local reading states: {err:#}");
        }
    }
}

fn records<'a>(all: &'a Collection, user_id: &str) -> &'a [Value] {
    all.get(user_id)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn raw_id(raw: &Value) -> Option<&str> {
    raw.get("id").and_then(Value::as_str)
}

/// Records saved without a user id belong to the list they sit in.
fn decode(user_id: &str, raw: &Value) -> Option<LocalReadingState> {
    match serde_json::from_value::<LocalReadingState>(raw.clone()) {
        Ok(mut entry) => {
            if entry.user_id.is_empty() {
                entry.user_id = user_id.to_string();
            }
            Some(entry)
        }
        Err(err) => {
            warn!(user_id, "skipping unreadable local reading state: {err}");
            None
        }
    }
}

fn encode(entry: &LocalReadingState) -> Option<Value> {
    serde_json::to_value(entry)
        .inspect_err(|err| warn!(id = %entry.id, "could not encode local reading state: {err}"))
        .ok()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
