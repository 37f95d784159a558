use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pr_dashboard::app::{ViewArgs, run_dashboard};
use pr_dashboard::clock::{Clock, SystemClock};
use pr_dashboard::config::loader;
use pr_dashboard::engine::{Engine, GitHubEngine, Request};
use pr_dashboard::github::GitHubClient;
use pr_dashboard::github::auth::resolve_token;
use pr_dashboard::history::MemoryHistory;
use pr_dashboard::query::Query;
use pr_dashboard::reconciler::Reconciler;
use pr_dashboard::session::SessionStore;
use pr_dashboard::storage::{FileStorage, Storage};

#[derive(Parser)]
#[command(
    name = "pr-dashboard",
    version,
    about = "Open pull requests of one GitHub repository, filtered and sorted"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    /// Start from a saved view, e.g. `?filter_statuses=needsReview&sort_column=createdAt`.
    #[arg(long, value_name = "QUERY")]
    query: Option<String>,

    /// Ignore cached pull requests.
    #[arg(long)]
    refresh: bool,

    /// Select filter values, e.g. `statuses=needsReview,isBlocked`. Repeatable.
    #[arg(long = "filter", value_name = "COLUMN=VALUES")]
    filters: Vec<String>,

    /// Sort column: createdAt, priorityLevel or statuses.
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending.
    #[arg(long)]
    reverse: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a GitHub token (defaults to gh CLI / GH_TOKEN / GITHUB_TOKEN).
    Login {
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the stored session.
    Logout,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    let config = loader::load_config(cli.config.as_deref())?;

    // octocrab's TLS stack needs a process-wide rustls provider.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("a rustls CryptoProvider was already installed");
    }

    let storage_dir = loader::storage_dir(&config)?;
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(storage_dir));
    let sessions = SessionStore::new(Arc::clone(&storage));

    match cli.command {
        Some(Commands::Login { token }) => {
            let resolved = resolve_token(&config.github.host, token.as_deref())?;
            tracing::debug!("using token from {}", resolved.source);
            let github = &config.github;
            let client =
                GitHubClient::new(&github.host, &github.owner, &github.repo, github.page_size);
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            let session = runtime.block_on(sessions.sign_in(&client, resolved.token))?;
            println!("signed in as {}", session.user.login);
            return Ok(());
        }
        Some(Commands::Logout) => {
            sessions.clear().context("removing stored session")?;
            println!("signed out");
            return Ok(());
        }
        None => {}
    }

    tracing::info!("pr-dashboard starting");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let initial_query = cli.query.as_deref().map(Query::parse).unwrap_or_default();
    let mut reconciler = Reconciler::new(
        MemoryHistory::new(initial_query),
        Arc::clone(&clock),
        config.view.loop_guard(),
    );

    // Dropping `engine` at the end of `main` closes the channel and stops the thread.
    let engine = GitHubEngine::new(config.clone(), storage)
        .with_clock(Arc::clone(&clock))
        .start();

    let args = ViewArgs {
        filters: cli.filters,
        sort: cli.sort,
        reverse: cli.reverse,
    };
    let rendered = run_dashboard(
        &config,
        &engine,
        &sessions,
        &mut reconciler,
        &args,
        cli.refresh,
        clock.now(),
    )?;
    engine.send(Request::Shutdown);

    print!("{rendered}");
    let query = reconciler.current_query();
    if !query.is_empty() {
        println!("\n?{query}");
    }
    Ok(())
}
