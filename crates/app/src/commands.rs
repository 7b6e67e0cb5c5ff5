use std::fs;
use std::path::Path;

use anyhow::{Context as _, anyhow, bail};
use bookclub_api::{ApiClient, BookSearchClient};
use bookclub_application::{
    AppError, Reconciler, ReportsSnapshot, find, load_reports, messages, require_session,
    search_catalog,
};
use bookclub_core::{
    BackendError, BookRecord, ClubActivityRow, DashboardSummary, MonthlyProgressRow,
    NewLocalReadingState, OutputFormat, ReadingPatch, ReadingStateEntry, Session, Settings,
    TopBookRow, UserBackend, VolumeSummary,
};
use bookclub_storage::{LocalReadingStore, Storage};
use directories::ProjectDirs;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{self, CONFIG_FILE_NAME, Overrides};
use crate::render;
use crate::{ReportKind, StatesCommand, UsersCommand};

const NOTHING_TO_UPDATE: &str = "Nothing to update: pass --status or --notes.";

pub struct Context {
    pub settings: Settings,
    session: Session,
    api: ApiClient,
    search: BookSearchClient,
    local: LocalReadingStore<Storage>,
}

impl Context {
    pub fn from_overrides(overrides: &Overrides) -> anyhow::Result<Self> {
        let dirs = config::project_dirs()
            .inspect_err(|err| warn!("{err:#}"))
            .ok();
        let default_config = dirs.as_ref().map(|d| d.config_dir().join(CONFIG_FILE_NAME));
        let settings = config::load_settings(overrides, default_config.as_deref())?;

        let api = ApiClient::new(&settings).context("build backend client")?;
        let search = BookSearchClient::new(&settings).context("build search client")?;
        let local = open_local(&settings, dirs.as_ref());
        Ok(Self {
            session: settings.session(),
            settings,
            api,
            search,
            local,
        })
    }

    fn user_id(&self) -> anyhow::Result<&str> {
        self.session
            .user_id()
            .ok_or_else(|| anyhow!(messages::SIGN_IN_REQUIRED))
    }

    fn reconciler(&self) -> Reconciler<'_, ApiClient, Storage> {
        Reconciler::new(&self.api, &self.local, &self.session)
    }

    fn json(&self) -> bool {
        self.settings.output == OutputFormat::Json
    }
}

/// Local entries still work without a database; they just do not persist.
fn open_local(settings: &Settings, dirs: Option<&ProjectDirs>) -> LocalReadingStore<Storage> {
    let Some(path) = config::database_path(settings, dirs) else {
        warn!("no data directory; local reading states will not be saved");
        return LocalReadingStore::detached();
    };
    match open_storage(&path) {
        Ok(storage) => LocalReadingStore::new(storage),
        Err(err) => {
            warn!("local store unavailable: {err:#}");
            LocalReadingStore::detached()
        }
    }
}

fn open_storage(path: &Path) -> anyhow::Result<Storage> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data dir {}", parent.display()))?;
    }
    Storage::open(path)
}

fn failure(err: AppError, fallback: &'static str) -> anyhow::Error {
    debug!("command failed: {err}");
    anyhow!(err.user_message(fallback))
}

fn backend_failure(err: BackendError, fallback: &'static str) -> anyhow::Error {
    failure(AppError::from(err), fallback)
}

fn emit<T: Serialize + ?Sized>(
    ctx: &Context,
    value: &T,
    table: impl FnOnce(&T) -> String,
) -> anyhow::Result<String> {
    if ctx.json() {
        let mut out = serde_json::to_string_pretty(value).context("encode json output")?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(table(value))
    }
}

pub async fn states(ctx: &Context, cmd: StatesCommand) -> anyhow::Result<String> {
    let user_id = ctx.user_id()?;
    let reconciler = ctx.reconciler();

    match cmd {
        StatesCommand::List => {
            let loaded = reconciler.load(user_id).await;
            let notice = loaded
                .is_partial()
                .then(|| messages::partial_results(&["reading states"]));
            let entries = loaded
                .into_entries()
                .map_err(|err| backend_failure(err, messages::LOAD_READING_STATES_FAILED))?;
            emit(ctx, entries.as_slice(), |entries| {
                with_notice(notice.as_deref(), render::reading_states(entries))
            })
        }
        StatesCommand::Add(args) => {
            if !ctx.local.is_attached() {
                warn!("local store is not attached; entry will not be saved");
            }
            let draft = NewLocalReadingState {
                google_id: args.google_id,
                book_id: args.book_id,
                title: args.title,
                authors: args.authors,
                status: args.status,
                notes: args.notes,
                thumbnail: None,
            };
            let entry = reconciler.add_local(user_id, draft);
            emit(ctx, &entry, |entry| render::reading_states(std::slice::from_ref(entry)))
        }
        StatesCommand::Update(args) => {
            let patch = ReadingPatch {
                status: args.status,
                notes: args.notes,
            };
            if patch.is_empty() {
                bail!(NOTHING_TO_UPDATE);
            }
            let entry = resolve(ctx, user_id, &args.key).await?;
            let updated = reconciler
                .update(&entry, &patch)
                .await
                .map_err(|err| failure(err, messages::UPDATE_READING_STATE_FAILED))?;
            emit(ctx, &updated, |entry| render::reading_states(std::slice::from_ref(entry)))
        }
        StatesCommand::Delete { key } => {
            let entry = resolve(ctx, user_id, &key).await?;
            reconciler
                .delete(&entry)
                .await
                .map_err(|err| failure(err, messages::DELETE_READING_STATE_FAILED))?;
            Ok(format!("Deleted {}.\n", entry.title))
        }
        StatesCommand::Import { id } => {
            let entry = reconciler
                .import_local(user_id, &id)
                .await
                .map_err(|err| failure(err, messages::IMPORT_READING_STATE_FAILED))?;
            emit(ctx, &entry, |entry| render::reading_states(std::slice::from_ref(entry)))
        }
    }
}

/// Looks the key up in whatever loaded. A remote failure only surfaces when
/// the key is not among the local entries.
async fn resolve(ctx: &Context, user_id: &str, key: &str) -> anyhow::Result<ReadingStateEntry> {
    let loaded = ctx.reconciler().load(user_id).await;
    if let Some(entry) = find(&loaded.entries, key) {
        return Ok(entry.clone());
    }
    match loaded.remote_error {
        Some(err) => Err(backend_failure(err, messages::LOAD_READING_STATES_FAILED)),
        None => Err(anyhow!(messages::ENTRY_NOT_FOUND)),
    }
}

fn with_notice(notice: Option<&str>, body: String) -> String {
    match notice {
        Some(notice) => format!("{notice}\n\n{body}"),
        None => body,
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly_progress: Option<Vec<MonthlyProgressRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_books: Option<Vec<TopBookRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    club_activity: Option<Vec<ClubActivityRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DashboardSummary>,
}

impl ReportOutput {
    fn build(snapshot: &ReportsSnapshot, kind: ReportKind) -> Self {
        let wants = |k: ReportKind| kind == k || kind == ReportKind::All;
        Self {
            notice: snapshot.status_message(),
            monthly_progress: wants(ReportKind::Monthly).then(|| snapshot.monthly_progress()),
            top_books: wants(ReportKind::TopBooks).then(|| snapshot.top_books()),
            club_activity: wants(ReportKind::Clubs).then(|| snapshot.club_activity()),
            summary: wants(ReportKind::Summary).then(|| snapshot.summary()),
        }
    }

    fn to_table(&self) -> String {
        let mut sections = Vec::new();
        if let Some(notice) = &self.notice {
            sections.push(format!("{notice}\n"));
        }
        if let Some(summary) = &self.summary {
            sections.push(format!("Summary\n{}", render::summary(summary)));
        }
        if let Some(rows) = &self.monthly_progress {
            sections.push(format!("Monthly progress\n{}", render::monthly_progress(rows)));
        }
        if let Some(rows) = &self.top_books {
            sections.push(format!("Top books\n{}", render::top_books(rows)));
        }
        if let Some(rows) = &self.club_activity {
            sections.push(format!("Club activity\n{}", render::club_activity(rows)));
        }
        sections.join("\n")
    }
}

pub async fn report(ctx: &Context, kind: ReportKind) -> anyhow::Result<String> {
    let snapshot = load_reports(&ctx.api, &ctx.local, &ctx.session, ctx.session.user_id()).await;
    let output = ReportOutput::build(&snapshot, kind);
    emit(ctx, &output, ReportOutput::to_table)
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    catalog: &'a [BookRecord],
    external: &'a [VolumeSummary],
}

pub async fn search(ctx: &Context, query: &str) -> anyhow::Result<String> {
    let results = search_catalog(&ctx.api, &ctx.search, &ctx.session, query).await;
    let output = SearchOutput {
        notice: results.status_message(),
        catalog: &results.catalog,
        external: &results.external,
    };
    emit(ctx, &output, |output| {
        let body = format!(
            "Club catalog\n{}\nBook search\n{}",
            render::catalog_books(output.catalog),
            render::volumes(output.external)
        );
        with_notice(output.notice.as_deref(), body)
    })
}

pub async fn users(ctx: &Context, cmd: UsersCommand) -> anyhow::Result<String> {
    require_session(&ctx.session).map_err(|err| failure(err, messages::LOAD_USERS_FAILED))?;

    let (id, active) = match cmd {
        UsersCommand::List => {
            let users = ctx
                .api
                .list_users(&ctx.session)
                .await
                .map_err(|err| backend_failure(err, messages::LOAD_USERS_FAILED))?;
            return emit(ctx, users.as_slice(), render::users);
        }
        UsersCommand::Activate { id } => (id, true),
        UsersCommand::Deactivate { id } => (id, false),
    };

    let user = ctx
        .api
        .set_user_active(&ctx.session, &id, active)
        .await
        .map_err(|err| backend_failure(err, messages::UPDATE_USER_FAILED))?;
    emit(ctx, &user, |user| render::users(std::slice::from_ref(user)))
}

pub fn show_config(ctx: &Context) -> anyhow::Result<String> {
    let settings = redacted(&ctx.settings);
    if ctx.json() {
        let mut out = serde_json::to_string_pretty(&settings).context("encode settings")?;
        out.push('\n');
        return Ok(out);
    }
    toml::to_string_pretty(&settings).context("encode settings")
}

fn redacted(settings: &Settings) -> Settings {
    let mut settings = settings.clone();
    if settings.token.is_some() {
        settings.token = Some("********".to_string());
    }
    settings
}
