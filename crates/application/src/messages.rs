//! User-facing strings. Front ends and their tests match these verbatim, so
//! changing one is a visible change.

pub const SIGN_IN_REQUIRED: &str = "You need to sign in to continue.";
pub const LOAD_READING_STATES_FAILED: &str = "Could not load your reading list.";
pub const UPDATE_READING_STATE_FAILED: &str = "Could not update the reading state.";
pub const DELETE_READING_STATE_FAILED: &str = "Could not delete the reading state.";
pub const IMPORT_READING_STATE_FAILED: &str = "Could not import the book into the club catalog.";
pub const ENTRY_READ_ONLY: &str = "This entry cannot be edited.";
pub const ENTRY_NOT_FOUND: &str = "Reading state not found.";
pub const LOAD_REPORTS_FAILED: &str = "Could not load report data.";
pub const SEARCH_FAILED: &str = "Could not search for books.";
pub const LOAD_USERS_FAILED: &str = "Could not load users.";
pub const UPDATE_USER_FAILED: &str = "Could not update the user.";
pub const NO_DATA: &str = "No data yet.";

/// Message for a load where some sources failed and the rest rendered.
pub fn partial_results(sources: &[&str]) -> String {
    format!("Some data could not be loaded: {}.", sources.join(", "))
}
