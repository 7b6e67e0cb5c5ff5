//! Page loads that fan out to several sources at once. Each source succeeds
//! or fails on its own; whatever arrived is kept.

use bookclub_core::{
    BookRecord, BookSearch, CatalogBackend, ClubActivityRow, ClubRecord, DashboardSummary,
    MonthlyProgressRow, ReadingStateBackend, ReadingStateEntry, ReviewRecord, Session,
    TopBookRow, VolumeSummary,
};
use bookclub_storage::{KeyValueStore, LocalReadingStore};
use tracing::warn;

use crate::messages;
use crate::reconcile::{LoadedStates, Reconciler};
use crate::reports;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: &'static str,
    pub error: String,
}

fn keep<T, E: std::fmt::Display>(
    result: Result<Vec<T>, E>,
    source: &'static str,
    failures: &mut Vec<SourceFailure>,
) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(source, "load failed: {err}");
        failures.push(SourceFailure {
            source,
            error: err.to_string(),
        });
        Vec::new()
    })
}

fn partial_message(failures: &[SourceFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let sources: Vec<&str> = failures.iter().map(|f| f.source).collect();
    Some(messages::partial_results(&sources))
}

/// Everything the reports page needs, fetched in one go.
#[derive(Debug, Clone, Default)]
pub struct ReportsSnapshot {
    pub reading_states: Vec<ReadingStateEntry>,
    pub reviews: Vec<ReviewRecord>,
    pub clubs: Vec<ClubRecord>,
    pub books: Vec<BookRecord>,
    pub failures: Vec<SourceFailure>,
    attempted: usize,
}

impl ReportsSnapshot {
    pub fn monthly_progress(&self) -> Vec<MonthlyProgressRow> {
        reports::monthly_progress(&self.reading_states)
    }

    pub fn top_books(&self) -> Vec<TopBookRow> {
        reports::top_books(&self.reviews, &self.books)
    }

    pub fn club_activity(&self) -> Vec<ClubActivityRow> {
        reports::club_activity(&self.clubs)
    }

    pub fn summary(&self) -> DashboardSummary {
        reports::dashboard_summary(&self.reading_states, &self.reviews, &self.clubs, &self.books)
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// `None` when every source loaded; otherwise the partial or total
    /// failure message to show above the report.
    pub fn status_message(&self) -> Option<String> {
        if self.attempted > 0 && self.failures.len() >= self.attempted {
            return Some(messages::LOAD_REPORTS_FAILED.to_string());
        }
        partial_message(&self.failures)
    }
}

/// Loads reading states (reconciled with local entries), reviews, clubs and
/// books concurrently. Without a user id no reading states are fetched.
pub async fn load_reports<B, S>(
    backend: &B,
    local: &LocalReadingStore<S>,
    session: &Session,
    user_id: Option<&str>,
) -> ReportsSnapshot
where
    B: ReadingStateBackend + CatalogBackend,
    S: KeyValueStore,
{
    let reconciler = Reconciler::new(backend, local, session);
    let states = async {
        match user_id {
            Some(user_id) => reconciler.load(user_id).await,
            None => LoadedStates::default(),
        }
    };
    let (states, reviews, clubs, books) = tokio::join!(
        states,
        backend.list_reviews(session),
        backend.list_clubs(session),
        backend.list_books(session),
    );

    let mut failures = Vec::new();
    if let Some(err) = &states.remote_error {
        warn!(source = "reading states", "load failed: {err}");
        failures.push(SourceFailure {
            source: "reading states",
            error: err.to_string(),
        });
    }
    ReportsSnapshot {
        reading_states: states.entries,
        reviews: keep(reviews, "reviews", &mut failures),
        clubs: keep(clubs, "clubs", &mut failures),
        books: keep(books, "books", &mut failures),
        failures,
        attempted: if user_id.is_some() { 4 } else { 3 },
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSearch {
    pub catalog: Vec<BookRecord>,
    /// External results not already present in the catalog.
    pub external: Vec<VolumeSummary>,
    pub failures: Vec<SourceFailure>,
}

impl CatalogSearch {
    pub fn status_message(&self) -> Option<String> {
        if self.failures.len() == 2 {
            return Some(messages::SEARCH_FAILED.to_string());
        }
        partial_message(&self.failures)
    }
}

fn matches_query(book: &BookRecord, query: &str) -> bool {
    let needle = query.to_lowercase();
    let compact: String = query.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    book.title.to_lowercase().contains(&needle)
        || book
            .authors
            .iter()
            .any(|author| author.to_lowercase().contains(&needle))
        || (!compact.is_empty()
            && book
                .isbn
                .as_deref()
                .is_some_and(|isbn| isbn.replace('-', "").eq_ignore_ascii_case(&compact)))
}

/// Searches the club catalog and the external provider side by side.
pub async fn search_catalog<C, X>(
    catalog: &C,
    search: &X,
    session: &Session,
    query: &str,
) -> CatalogSearch
where
    C: CatalogBackend,
    X: BookSearch,
{
    let query = query.trim();
    if query.is_empty() {
        return CatalogSearch::default();
    }

    let (books, volumes) = tokio::join!(catalog.list_books(session), search.search_volumes(query));

    let mut failures = Vec::new();
    let catalog: Vec<BookRecord> = keep(books, "catalog", &mut failures)
        .into_iter()
        .filter(|book| matches_query(book, query))
        .collect();
    let external = keep(volumes, "book search", &mut failures)
        .into_iter()
        .filter(|volume| {
            !catalog
                .iter()
                .any(|book| book.google_id.as_deref() == Some(volume.google_id.as_str()))
        })
        .collect();

    CatalogSearch {
        catalog,
        external,
        failures,
    }
}
