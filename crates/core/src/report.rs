//! Derived report rows. Never persisted; recomputed from each fetch.

use serde::Serialize;

pub const UNKNOWN_MONTH: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProgressRow {
    pub month: String,
    pub reading: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopBookRow {
    pub title: String,
    pub reviews: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubActivityRow {
    pub name: String,
    pub members: u64,
    pub posts: u64,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_books: u64,
    pub total_reviews: u64,
    pub total_clubs: u64,
    pub active_clubs: u64,
    pub to_read: u64,
    pub reading: u64,
    pub completed: u64,
    pub average_rating: Option<f64>,
}
