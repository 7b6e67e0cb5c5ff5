//! Core domain types for Bookclub.

pub mod backend;
pub mod reading;
pub mod records;
pub mod report;
pub mod status;

use serde::{Deserialize, Serialize};

pub use backend::{BackendError, BackendResult, BookSearch, CatalogBackend, ReadingStateBackend, UserBackend};
pub use reading::{
    EntryKey, LocalReadingState, NewLocalReadingState, NewRemoteReadingState, Origin,
    ReadingPatch, ReadingStateEntry, RemoteReadingState, RemoteReadingStatePatch,
};
pub use records::{BookRecord, ClubRecord, ReviewRecord, UserRecord, UserRole, VolumeSummary};
pub use report::{ClubActivityRow, DashboardSummary, MonthlyProgressRow, TopBookRow};
pub use status::{ApiStatus, UiStatus, to_ui_status, ui_to_api_status};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.googleapis.com/books/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub search_base_url: String,
    pub request_timeout_secs: u64,
    pub output: OutputFormat,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err("unknown output format"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            request_timeout_secs: 15,
            output: OutputFormat::Table,
            token: None,
            user_id: None,
            data_dir: None,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
        self.api_base_url = normalize_url(&self.api_base_url, DEFAULT_API_BASE_URL);
        self.search_base_url = normalize_url(&self.search_base_url, DEFAULT_SEARCH_BASE_URL);
        self.token = non_empty(self.token.take());
        self.user_id = non_empty(self.user_id.take());
        self.data_dir = non_empty(self.data_dir.take());
    }

    pub fn session(&self) -> Session {
        Session::new(self.token.clone(), self.user_id.clone())
    }
}

fn normalize_url(value: &str, fallback: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Who is calling the backend. Passed explicitly to every backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user_id: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>, user_id: Option<String>) -> Self {
        Self {
            token: non_empty(token),
            user_id: non_empty(user_id),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
