mod commands;
mod config;
mod render;

use std::path::PathBuf;

use bookclub_core::UiStatus;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "bookclub", version, about = "Reading states, reports and search for a book club")]
struct Cli {
    /// Path to a TOML settings file.
    #[arg(long, global = true, env = "BOOKCLUB_CONFIG")]
    config: Option<PathBuf>,

    /// Bearer token for the club backend.
    #[arg(long, global = true, env = "BOOKCLUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Id of the signed-in user.
    #[arg(long, global = true, env = "BOOKCLUB_USER")]
    user: Option<String>,

    /// Base URL of the club backend.
    #[arg(long, global = true, env = "BOOKCLUB_API_URL")]
    api_url: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            token: self.token.clone(),
            user: self.user.clone(),
            api_url: self.api_url.clone(),
            json: self.json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage reading states, both backend and local.
    #[command(subcommand)]
    States(StatesCommand),

    /// Show reading and club reports.
    Report {
        #[arg(value_enum, default_value_t = ReportKind::All)]
        kind: ReportKind,
    },

    /// Search the club catalog and the external book provider.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Administer club users.
    #[command(subcommand)]
    Users(UsersCommand),

    /// Print the effective settings.
    Config,
}

#[derive(Subcommand, Debug)]
pub(crate) enum StatesCommand {
    List,
    /// Save a reading state on this machine only.
    Add(AddArgs),
    Update(UpdateArgs),
    Delete {
        key: String,
    },
    /// Push a local reading state to the backend.
    Import {
        id: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct AddArgs {
    pub title: String,
    #[arg(long = "author")]
    pub authors: Vec<String>,
    #[arg(long, default_value_t = UiStatus::ToRead)]
    pub status: UiStatus,
    #[arg(long, default_value = "")]
    pub notes: String,
    #[arg(long)]
    pub google_id: Option<String>,
    #[arg(long)]
    pub book_id: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateArgs {
    /// Entry id, book id or external id.
    pub key: String,
    #[arg(long)]
    pub status: Option<UiStatus>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportKind {
    Monthly,
    TopBooks,
    Clubs,
    Summary,
    All,
}

#[derive(Subcommand, Debug)]
pub(crate) enum UsersCommand {
    List,
    Activate { id: String },
    Deactivate { id: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let ctx = commands::Context::from_overrides(&cli.overrides())?;

    let output = runtime.block_on(async {
        match cli.command {
            Command::States(cmd) => commands::states(&ctx, cmd).await,
            Command::Report { kind } => commands::report(&ctx, kind).await,
            Command::Search { query } => commands::search(&ctx, &query.join(" ")).await,
            Command::Users(cmd) => commands::users(&ctx, cmd).await,
            Command::Config => commands::show_config(&ctx),
        }
    })?;

    print!("{output}");
    Ok(())
}
