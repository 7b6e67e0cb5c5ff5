use std::time::Duration;

use bookclub_core::{BackendResult, BookSearch, Settings, VolumeSummary};
use tracing::debug;

use crate::{collection_items, http_client, network_error, read_json};

const MAX_RESULTS: &str = "20";

/// Client for a Google Books compatible `volumes` endpoint.
#[derive(Debug, Clone)]
pub struct BookSearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl BookSearchClient {
    pub fn new(settings: &Settings) -> BackendResult<Self> {
        Self::with_base_url(
            &settings.search_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl BookSearch for BookSearchClient {
    async fn search_volumes(&self, query: &str) -> BackendResult<Vec<VolumeSummary>> {
        let Some(q) = build_search_query(query) else {
            return Ok(Vec::new());
        };
        let url = format!("{}/volumes", self.base_url);
        debug!(%url, q = %q, "book search");
        let response = self
            .http
            .get(url)
            .query(&[("q", q.as_str()), ("maxResults", MAX_RESULTS)])
            .send()
            .await
            .map_err(network_error)?;
        let body = read_json(response).await?;
        Ok(collection_items(body)
            .iter()
            .filter_map(VolumeSummary::from_json)
            .collect())
    }
}

/// `isbn:<digits>` for ISBN-10/13 input, `intitle:<text>` otherwise. Blank
/// input yields `None`.
pub fn build_search_query(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match normalize_isbn(trimmed) {
        Some(isbn) => Some(format!("isbn:{isbn}")),
        None => Some(format!("intitle:{trimmed}")),
    }
}

fn normalize_isbn(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !compact.is_ascii() {
        return None;
    }
    let valid = match compact.len() {
        10 => {
            let (body, last) = compact.split_at(9);
            body.chars().all(|c| c.is_ascii_digit())
                && last.chars().all(|c| c.is_ascii_digit() || c == 'X')
        }
        13 => compact.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };
    valid.then_some(compact)
}
