//! Backend record adapters.
//!
//! The backend is loose about field names (`_id` vs `id`, `comment` vs `text`,
//! `isActive` vs `active` vs `status`). Every record crosses into the crate
//! through one of the `from_json` functions here, so the rest of the code
//! only ever sees the normalized shape.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::status::{UiStatus, to_ui_status};

pub(crate) fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
}

/// Strings are trimmed and dropped when empty; numbers are rendered as-is.
pub(crate) fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => field(obj, &["id", "_id"]).and_then(id_value),
        _ => None,
    }
}

pub(crate) fn id_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find_map(id_value)
}

pub(crate) fn str_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().filter_map(|name| obj.get(*name)).find_map(|value| {
        value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => str_field(obj, &["name", "fullName"]),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn number_field(obj: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().filter_map(|name| obj.get(*name)).find_map(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn nested_object<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Map<String, Value>> {
    names.iter().filter_map(|name| obj.get(*name)).find_map(Value::as_object)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Option<String>,
    pub book_id: Option<String>,
    pub book_title: Option<String>,
    pub user_id: Option<String>,
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

impl ReviewRecord {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let book = nested_object(obj, &["book", "bookId"]);
        let book_title = book
            .and_then(|book| str_field(book, &["title"]))
            .or_else(|| str_field(obj, &["bookTitle"]));
        Some(Self {
            id: id_field(obj, &["id", "_id"]),
            book_id: id_field(obj, &["bookId", "book"]),
            book_title,
            user_id: id_field(obj, &["userId", "user"]),
            rating: number_field(obj, &["rating", "score"]),
            comment: str_field(obj, &["comment", "text", "body"]),
            created_at: str_field(obj, &["createdAt", "created_at"]),
        })
    }

    /// Title used when grouping reviews per book.
    pub fn display_title(&self) -> String {
        match (&self.book_title, &self.book_id) {
            (Some(title), _) => title.clone(),
            (None, Some(id)) => format!("Book #{id}"),
            (None, None) => "Unknown book".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubRecord {
    pub id: Option<String>,
    pub name: String,
    pub member_count: u64,
    pub debate_message_count: u64,
    pub active: bool,
}

impl ClubRecord {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let member_count = match obj.get("members") {
            Some(Value::Array(members)) => members.len() as u64,
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            _ => number_field(obj, &["memberCount", "membersCount"])
                .map(|n| n.max(0.0) as u64)
                .unwrap_or(0),
        };
        let debate_message_count = match obj.get("debates") {
            Some(Value::Array(debates)) => debates
                .iter()
                .filter_map(Value::as_object)
                .map(|debate| match debate.get("messages") {
                    Some(Value::Array(messages)) => messages.len() as u64,
                    Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
                    _ => 0,
                })
                .sum(),
            _ => 0,
        };
        Some(Self {
            id: id_field(obj, &["id", "_id"]),
            name: str_field(obj, &["name", "title"]).unwrap_or_else(|| "Unnamed club".to_string()),
            member_count,
            debate_message_count,
            active: active_flag(obj),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: Option<String>,
    pub google_id: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub isbn: Option<String>,
    /// Raw catalog status as sent by the backend.
    pub status: Option<String>,
}

impl BookRecord {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut authors = string_list(field(obj, &["authors"]));
        if authors.is_empty() {
            authors = string_list(field(obj, &["author"]));
        }
        Some(Self {
            id: id_field(obj, &["id", "_id"]),
            google_id: str_field(obj, &["googleId", "google_id", "externalId"]),
            title: str_field(obj, &["title", "name"]).unwrap_or_else(|| "Untitled".to_string()),
            authors,
            isbn: str_field(obj, &["isbn", "isbn13", "isbn10"]),
            status: str_field(obj, &["status", "readingStatus"]),
        })
    }

    pub fn ui_status(&self) -> UiStatus {
        to_ui_status(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub active: bool,
}

impl UserRecord {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let role = match str_field(obj, &["role"]).as_deref().map(str::to_ascii_lowercase) {
            Some(role) if role == "admin" => UserRole::Admin,
            _ if obj.get("isAdmin").and_then(Value::as_bool) == Some(true) => UserRole::Admin,
            _ => UserRole::Member,
        };
        let email = str_field(obj, &["email"]);
        let name = str_field(obj, &["name", "username", "displayName"])
            .or_else(|| email.clone())
            .unwrap_or_else(|| "Anonymous".to_string());
        Some(Self {
            id: id_field(obj, &["id", "_id"]),
            name,
            email,
            role,
            active: active_flag(obj),
        })
    }
}

/// `active` / `isActive` booleans win; otherwise a `status` string is read,
/// where anything other than an explicit inactive word counts as active.
fn active_flag(obj: &Map<String, Value>) -> bool {
    if let Some(flag) = ["active", "isActive"]
        .iter()
        .filter_map(|name| obj.get(*name))
        .find_map(Value::as_bool)
    {
        return flag;
    }
    match str_field(obj, &["status"]).map(|s| s.to_ascii_lowercase()) {
        Some(status) => !matches!(
            status.as_str(),
            "inactive" | "disabled" | "suspended" | "archived" | "closed"
        ),
        None => true,
    }
}

/// Book metadata from the external search provider, reduced to what the
/// rest of the crate needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSummary {
    pub google_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub thumbnail: Option<String>,
    pub published_date: Option<String>,
}

impl VolumeSummary {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let google_id = id_field(obj, &["id"])?;
        let info = nested_object(obj, &["volumeInfo"]);
        let title = info
            .and_then(|info| str_field(info, &["title"]))
            .unwrap_or_else(|| "Untitled".to_string());
        let authors = string_list(info.and_then(|info| field(info, &["authors"])));

        let mut isbn_10 = None;
        let mut isbn_13 = None;
        if let Some(Value::Array(ids)) = info.and_then(|info| info.get("industryIdentifiers")) {
            for id in ids.iter().filter_map(Value::as_object) {
                let kind = str_field(id, &["type"]).unwrap_or_default();
                let number = str_field(id, &["identifier"]);
                match kind.as_str() {
                    "ISBN_10" => isbn_10 = isbn_10.or(number),
                    "ISBN_13" => isbn_13 = isbn_13.or(number),
                    _ => {}
                }
            }
        }

        let thumbnail = info
            .and_then(|info| nested_object(info, &["imageLinks"]))
            .and_then(|links| str_field(links, &["thumbnail", "smallThumbnail"]))
            .map(|link| match link.strip_prefix("http://") {
                Some(rest) => format!("https://{rest}"),
                None => link,
            });

        Some(Self {
            google_id,
            title,
            authors,
            isbn_10,
            isbn_13,
            thumbnail,
            published_date: info.and_then(|info| str_field(info, &["publishedDate"])),
        })
    }
}
