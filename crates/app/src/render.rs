//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use bookclub_application::messages;
use bookclub_core::{
    BookRecord, ClubActivityRow, DashboardSummary, MonthlyProgressRow, ReadingStateEntry,
    TopBookRow, UserRecord, VolumeSummary,
};

const MAX_CELL: usize = 48;

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_CELL {
        return value.to_string();
    }
    let mut out: String = value.chars().take(MAX_CELL - 1).collect();
    out.push('…');
    out
}

pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return format!("{}\n", messages::NO_DATA);
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    write_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(&mut out, &rule, &widths);
    for row in &rows {
        write_row(&mut out, row, &widths);
    }
    out
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        let pad = width.saturating_sub(cell.chars().count());
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', pad));
    }
    let _ = writeln!(out, "{}", line.trim_end());
}

pub fn reading_states(entries: &[ReadingStateEntry]) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.key().as_str().unwrap_or("(read-only)").to_string(),
                entry.origin.to_string(),
                entry.status.to_string(),
                entry.title.clone(),
                entry.authors.join(", "),
                entry.last_touched().unwrap_or("").to_string(),
            ]
        })
        .collect();
    table(&["KEY", "ORIGIN", "STATUS", "TITLE", "AUTHORS", "UPDATED"], &rows)
}

pub fn monthly_progress(rows: &[MonthlyProgressRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.month.clone(),
                row.reading.to_string(),
                row.completed.to_string(),
            ]
        })
        .collect();
    table(&["MONTH", "READING", "COMPLETED"], &rows)
}

pub fn top_books(rows: &[TopBookRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| vec![(i + 1).to_string(), row.title.clone(), row.reviews.to_string()])
        .collect();
    table(&["#", "TITLE", "REVIEWS"], &rows)
}

pub fn club_activity(rows: &[ClubActivityRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.name.clone(),
                row.members.to_string(),
                row.posts.to_string(),
                row.score.to_string(),
            ]
        })
        .collect();
    table(&["CLUB", "MEMBERS", "POSTS", "SCORE"], &rows)
}

pub fn summary(summary: &DashboardSummary) -> String {
    let rating = summary
        .average_rating
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| "-".to_string());
    let rows = vec![
        vec!["Books".to_string(), summary.total_books.to_string()],
        vec!["Reviews".to_string(), summary.total_reviews.to_string()],
        vec![
            "Clubs (active)".to_string(),
            format!("{} ({})", summary.total_clubs, summary.active_clubs),
        ],
        vec!["To read".to_string(), summary.to_read.to_string()],
        vec!["Reading".to_string(), summary.reading.to_string()],
        vec!["Completed".to_string(), summary.completed.to_string()],
        vec!["Average rating".to_string(), rating],
    ];
    table(&["METRIC", "VALUE"], &rows)
}

pub fn catalog_books(books: &[BookRecord]) -> String {
    let rows: Vec<Vec<String>> = books
        .iter()
        .map(|book| {
            vec![
                book.id.clone().unwrap_or_default(),
                book.title.clone(),
                book.authors.join(", "),
                book.ui_status().to_string(),
            ]
        })
        .collect();
    table(&["ID", "TITLE", "AUTHORS", "STATUS"], &rows)
}

pub fn volumes(volumes: &[VolumeSummary]) -> String {
    let rows: Vec<Vec<String>> = volumes
        .iter()
        .map(|volume| {
            vec![
                volume.google_id.clone(),
                volume.title.clone(),
                volume.authors.join(", "),
                volume
                    .isbn_13
                    .clone()
                    .or_else(|| volume.isbn_10.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    table(&["GOOGLE ID", "TITLE", "AUTHORS", "ISBN"], &rows)
}

pub fn users(users: &[UserRecord]) -> String {
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|user| {
            vec![
                user.id.clone().unwrap_or_default(),
                user.name.clone(),
                user.email.clone().unwrap_or_default(),
                user.role.as_str().to_string(),
                if user.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "EMAIL", "ROLE", "ACTIVE"], &rows)
}
