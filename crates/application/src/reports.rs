//! Report aggregation over already-fetched collections. Everything here is
//! pure; empty input gives empty output.

use std::collections::{BTreeMap, HashMap};

use bookclub_core::report::UNKNOWN_MONTH;
use bookclub_core::{
    BookRecord, ClubActivityRow, ClubRecord, DashboardSummary, MonthlyProgressRow,
    ReadingStateEntry, ReviewRecord, TopBookRow, UiStatus,
};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};

pub const TOP_BOOKS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MonthKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl MonthKey {
    fn label(&self) -> String {
        match self {
            MonthKey::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1)
                .map(|date| date.format("%b %Y").to_string())
                .unwrap_or_else(|| UNKNOWN_MONTH.to_string()),
            MonthKey::Unknown => UNKNOWN_MONTH.to_string(),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn month_of(entry: &ReadingStateEntry) -> MonthKey {
    [entry.updated_at.as_deref(), entry.created_at.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_date)
        .map(|date| MonthKey::Month {
            year: date.year(),
            month: date.month(),
        })
        .unwrap_or(MonthKey::Unknown)
}

/// Entries per calendar month of their last update, oldest first, with the
/// `Unknown` bucket last.
pub fn monthly_progress(entries: &[ReadingStateEntry]) -> Vec<MonthlyProgressRow> {
    let mut buckets: BTreeMap<MonthKey, (u64, u64)> = BTreeMap::new();
    for entry in entries {
        let (reading, completed) = buckets.entry(month_of(entry)).or_default();
        if entry.status.is_completed() {
            *completed += 1;
        } else {
            *reading += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(key, (reading, completed))| MonthlyProgressRow {
            month: key.label(),
            reading,
            completed,
        })
        .collect()
}

/// Counts in first-seen order, then a stable sort so ties keep that order.
fn ranked<I>(titles: I, limit: usize) -> Vec<TopBookRow>
where
    I: IntoIterator<Item = String>,
{
    let mut rows: Vec<TopBookRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for title in titles {
        match index.get(&title) {
            Some(&i) => rows[i].reviews += 1,
            None => {
                index.insert(title.clone(), rows.len());
                rows.push(TopBookRow { title, reviews: 1 });
            }
        }
    }
    rows.sort_by(|a, b| b.reviews.cmp(&a.reviews));
    rows.truncate(limit);
    rows
}

/// Most-reviewed books. With no reviews at all, falls back to counting
/// catalog books marked as read.
pub fn top_books(reviews: &[ReviewRecord], books: &[BookRecord]) -> Vec<TopBookRow> {
    if !reviews.is_empty() {
        return ranked(reviews.iter().map(ReviewRecord::display_title), TOP_BOOKS_LIMIT);
    }
    ranked(
        books
            .iter()
            .filter(|book| book.ui_status().is_completed())
            .map(|book| book.title.clone()),
        TOP_BOOKS_LIMIT,
    )
}

/// `score = 2 * members + debate messages`, highest first.
pub fn club_activity(clubs: &[ClubRecord]) -> Vec<ClubActivityRow> {
    let mut rows: Vec<ClubActivityRow> = clubs
        .iter()
        .map(|club| ClubActivityRow {
            name: club.name.clone(),
            members: club.member_count,
            posts: club.debate_message_count,
            score: club
                .member_count
                .saturating_mul(2)
                .saturating_add(club.debate_message_count),
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows
}

pub fn dashboard_summary(
    states: &[ReadingStateEntry],
    reviews: &[ReviewRecord],
    clubs: &[ClubRecord],
    books: &[BookRecord],
) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_books: books.len() as u64,
        total_reviews: reviews.len() as u64,
        total_clubs: clubs.len() as u64,
        active_clubs: clubs.iter().filter(|club| club.active).count() as u64,
        ..DashboardSummary::default()
    };
    for entry in states {
        match entry.status {
            UiStatus::ToRead => summary.to_read += 1,
            UiStatus::Reading => summary.reading += 1,
            UiStatus::Completed => summary.completed += 1,
        }
    }

    let ratings: Vec<f64> = reviews.iter().filter_map(|review| review.rating).collect();
    if !ratings.is_empty() {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        summary.average_rating = Some((mean * 10.0).round() / 10.0);
    }
    summary
}
