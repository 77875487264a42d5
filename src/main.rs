mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod filter;
mod infra;
mod services;
mod session;
mod workflow;

use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::auth::{self, LoginArgs, SignupArgs};
use crate::cmd::comment::{self as comment_cmd, CommentArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::notifications::{self as notifications_cmd, NotificationsArgs};
use crate::cmd::ticket::{self as ticket_cmd, TicketArgs};
use crate::cmd::watch as watch_cmd;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::comments::CommentTable;
use crate::infra::feed::CommentFeedClient;
use crate::infra::notifications::NotificationTable;
use crate::infra::profiles::ProfileDirectory;
use crate::infra::rest::RestClient;
use crate::infra::storage::ObjectBucket;
use crate::infra::tickets::TicketTable;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "demandas", author, version, about = "Team ticket dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email/password, or print the Google OAuth URL.
    Login(LoginArgs),
    /// Create an account on the backend.
    Signup(SignupArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage CLI configuration.
    Config(ConfigArgs),
    /// Inspect and mutate tickets.
    Ticket(TicketArgs),
    /// Work with a ticket's comment thread.
    Comment(CommentArgs),
    /// Your notification inbox.
    Notifications(NotificationsArgs),
    /// Follow a ticket's comments live.
    Watch { ticket: i64 },
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Login(args) => {
            let config = AppConfig::load()?;
            auth::login(&config, args).await
        }
        Commands::Signup(args) => {
            let config = AppConfig::load()?;
            auth::signup(&config, args).await
        }
        Commands::Logout => auth::logout(),
        Commands::Whoami => auth::whoami(),
        Commands::Ticket(args) => {
            let ctx = build_context()?;
            ticket_cmd::run(&ctx, args).await
        }
        Commands::Comment(args) => {
            let ctx = build_context()?;
            comment_cmd::run(&ctx, args).await
        }
        Commands::Notifications(args) => {
            let ctx = build_context()?;
            notifications_cmd::run(&ctx, args).await
        }
        Commands::Watch { ticket } => {
            let ctx = build_context()?;
            watch_cmd::run(&ctx, ticket).await
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    let session = Session::load()?
        .ok_or_else(|| AppError::Auth("no stored session, run `demandas login`".to_string()))?;
    if session.is_expired(Utc::now()) {
        return Err(AppError::Auth(
            "stored session expired, run `demandas login` again".to_string(),
        ));
    }

    let rest = Arc::new(RestClient::new(&config));
    let tickets = Arc::new(TicketTable::new(rest.clone()));
    let comments = Arc::new(CommentTable::new(rest.clone()));
    let notifications = Arc::new(NotificationTable::new(rest.clone()));
    let directory = Arc::new(ProfileDirectory::new(rest));
    let files = Arc::new(ObjectBucket::new(&config));
    let feed = Arc::new(CommentFeedClient::new(&config));

    Ok(AppContext::new(
        config,
        session,
        tickets,
        comments,
        notifications,
        directory,
        files,
        feed,
    ))
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
