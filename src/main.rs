use analytics::SessionProvider;
use clap::{Parser, Subcommand};
use configuration::{Config, load_config, logging};
use core_types::{Role, Scope};
use database::{DbRepository, connect, run_migrations};
use mailer::{Dispatcher, FileDropTransport, ReportTransport, SmtpTransport};
use scheduler::{ReportScheduler, WeeklySchedule};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use web_server::{AppState, run_server};

/// The main entry point for the CPA manager.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config()?;
    let _log_guard = logging::init(&config.logging)?;

    // Initialize the database connection and run migrations
    let db_pool = connect(&config.database).await?;
    run_migrations(&db_pool).await?;
    let repo = DbRepository::new(db_pool);
    repo.ensure_admin(&config.admin.super_admin).await?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => handle_serve(config, repo).await,
        Commands::SendReport(args) => handle_send_report(args, config, repo).await,
        Commands::CreateUser(args) => handle_create_user(args, repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Cycle and profile management with weekly consolidated PDF reports.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the weekly report scheduler.
    Serve,
    /// Build and send a report once, then exit.
    SendReport(SendReportArgs),
    /// Register a user account.
    CreateUser(CreateUserArgs),
}

#[derive(Parser)]
struct SendReportArgs {
    /// Report on this user only, given by username or id. Without it, every
    /// user with recent activity is included.
    #[arg(long)]
    user: Option<String>,

    /// Write the PDF into this directory instead of emailing it.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Parser)]
struct CreateUserArgs {
    /// The login name, as asserted by the authentication gateway.
    username: String,

    /// Give the account the admin role.
    #[arg(long)]
    admin: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Starts the scheduler and serves HTTP until Ctrl-C.
async fn handle_serve(config: Config, repo: DbRepository) -> anyhow::Result<()> {
    let sessions: Arc<dyn SessionProvider> = Arc::new(repo.clone());
    let transport = Arc::new(SmtpTransport::new(&config.mail)?);
    let dispatcher = Arc::new(Dispatcher::new(sessions.clone(), transport, &config.report));
    let schedule = WeeklySchedule::from_config(&config.schedule)?;
    let reports = Arc::new(ReportScheduler::new(dispatcher, schedule));
    reports.start();

    let state = Arc::new(AppState {
        repo: repo.clone(),
        identities: Arc::new(repo),
        sessions,
        reports: reports.clone(),
        super_admin: config.admin.super_admin.clone(),
        identity_header: config.server.identity_header.clone(),
    });

    tokio::select! {
        result = run_server(state, config.server.addr) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received.");
        }
    }

    reports.stop().await;
    Ok(())
}

/// One-shot dispatch, for cron jobs and manual runs.
async fn handle_send_report(
    args: SendReportArgs,
    config: Config,
    repo: DbRepository,
) -> anyhow::Result<()> {
    let scope = match &args.user {
        Some(user) => {
            let found = match user.parse::<Uuid>() {
                Ok(id) => repo.get_user(id).await?,
                Err(_) => repo.find_user_by_username(user).await?,
            };
            let found = found.ok_or_else(|| anyhow::anyhow!("Unknown user '{}'", user))?;
            Scope::Single(found.id)
        }
        None => Scope::All,
    };

    let transport: Arc<dyn ReportTransport> = match args.output_dir {
        Some(dir) => Arc::new(FileDropTransport::new(dir)),
        None => Arc::new(SmtpTransport::new(&config.mail)?),
    };
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(repo), transport, &config.report));

    let outcome = dispatcher.run_contained(scope).await;
    println!("{}", outcome.message());
    if !outcome.is_success() {
        anyhow::bail!("Report dispatch failed");
    }
    Ok(())
}

async fn handle_create_user(args: CreateUserArgs, repo: DbRepository) -> anyhow::Result<()> {
    let role = if args.admin { Role::Admin } else { Role::User };
    let user = repo.create_user(&args.username, role).await?;
    println!("Created {} '{}' ({})", user.role, user.username, user.id);
    Ok(())
}
