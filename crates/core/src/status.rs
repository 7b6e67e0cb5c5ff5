//! Reading-status vocabularies and the mapping between them.
//!
//! The UI speaks `to-read` / `reading` / `completed`, the backend speaks
//! `pending` / `reading` / `read`. Raw values coming from either side are
//! folded into [`UiStatus`] with [`to_ui_status`], which never fails.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiStatus {
    ToRead,
    Reading,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Pending,
    Reading,
    Read,
}

impl UiStatus {
    pub const ALL: [UiStatus; 3] = [UiStatus::ToRead, UiStatus::Reading, UiStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            UiStatus::ToRead => "to-read",
            UiStatus::Reading => "reading",
            UiStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, UiStatus::Completed)
    }
}

impl std::fmt::Display for UiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse used for user input. Accepts the same synonyms as
/// [`to_ui_status`] but rejects anything it would have defaulted.
impl std::str::FromStr for UiStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        recognize(value).ok_or("unknown reading status")
    }
}

impl ApiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStatus::Pending => "pending",
            ApiStatus::Reading => "reading",
            ApiStatus::Read => "read",
        }
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UiStatus> for ApiStatus {
    fn from(value: UiStatus) -> Self {
        ui_to_api_status(value)
    }
}

impl From<ApiStatus> for UiStatus {
    fn from(value: ApiStatus) -> Self {
        to_ui_status(Some(value.as_str()))
    }
}

fn recognize(raw: &str) -> Option<UiStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" | "to-read" | "to read" | "to_read" | "toread" => Some(UiStatus::ToRead),
        "read" | "completed" | "complete" => Some(UiStatus::Completed),
        "reading" => Some(UiStatus::Reading),
        _ => None,
    }
}

/// Folds any raw status into the UI vocabulary. Unknown or missing input
/// becomes [`UiStatus::Reading`].
pub fn to_ui_status(raw: Option<&str>) -> UiStatus {
    raw.and_then(recognize).unwrap_or(UiStatus::Reading)
}

/// Serde helper for persisted records: any stored value is folded through
/// [`to_ui_status`] so one odd status cannot invalidate a whole collection.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<UiStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(to_ui_status(raw.as_deref()))
}

pub fn ui_to_api_status(ui: UiStatus) -> ApiStatus {
    match ui {
        UiStatus::ToRead => ApiStatus::Pending,
        UiStatus::Reading => ApiStatus::Reading,
        UiStatus::Completed => ApiStatus::Read,
    }
}
