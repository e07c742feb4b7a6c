use std::path::PathBuf;
use std::sync::Arc;

use academia::config::ConfigError;
use academia::net::client::ApiClient;
use academia::net::types::ApiError;
use academia::session::{Access, RouteGuard, SessionPhase};
use academia::storage::FileStore;
use academia::{AuthError, ClientConfig, Role, SessionManager, User};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not signed in")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "academia", about = "Academia session and API CLI")]
struct Cli {
    #[arg(long, env = "ACADEMIA_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "ACADEMIA_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[arg(long, env = "ACADEMIA_SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,

    /// Log at debug level.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the session and print its phase.
    Status,
    /// Print the current user as JSON.
    Whoami,
    /// Check whether the session may open a protected route.
    Access {
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        fallback: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ACADEMIA_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        role: Option<Role>,
    },
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ACADEMIA_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "student")]
        role: Role,
    },
    Logout,
    /// GET an API path and print the unwrapped JSON.
    Get { path: String },
}

struct CliContext {
    client: Arc<ApiClient>,
    session: SessionManager,
}

impl CliContext {
    fn build(cli: &Cli) -> Result<Self, CliError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(base_url) = &cli.base_url {
            config.base_url = ClientConfig::new(base_url)?.base_url;
        }
        if let Some(dir) = &cli.storage_dir {
            config.storage_dir.clone_from(dir);
        }
        if cli.session_cookie.is_some() {
            config.session_cookie.clone_from(&cli.session_cookie);
        }

        let store = Arc::new(FileStore::for_origin(&config.storage_dir, config.origin()));
        tracing::debug!(base_url = %config.base_url, store = %store.path().display(), "cli context ready");
        let client = Arc::new(ApiClient::new(&config)?);
        let session = SessionManager::from_client(client.clone(), store);
        Ok(Self { client, session })
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(error) = dotenv {
        if !error.not_found() {
            tracing::warn!(%error, "failed to load .env");
        }
    }

    let ctx = CliContext::build(&cli)?;
    match cli.command {
        Command::Status => run_status(&ctx).await,
        Command::Whoami => run_whoami(&ctx).await,
        Command::Access { role, fallback } => run_access(&ctx, role, fallback).await,
        Command::Login { email, password, role } => {
            let user = ctx.session.login(&email, &password, role).await?;
            print_user(&user)
        }
        Command::Signup { email, password, name, role } => {
            let user = ctx.session.signup(&email, &password, &name, role).await?;
            print_user(&user)
        }
        Command::Logout => {
            ctx.session.initialize().await;
            ctx.session.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Get { path } => {
            ctx.session.initialize().await;
            let json = ctx.client.get_json(&path).await?;
            print_json(&json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();
}

async fn run_status(ctx: &CliContext) -> Result<(), CliError> {
    ctx.session.initialize().await;
    let state = ctx.session.snapshot();
    match (state.phase(), state.user()) {
        (SessionPhase::Authenticated, Some(user)) => println!("authenticated as {} ({})", user.email, user.role),
        (SessionPhase::Unresolved, _) => println!("unresolved"),
        _ => println!("anonymous"),
    }
    Ok(())
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    ctx.session.initialize().await;
    let user = ctx.session.user().ok_or(CliError::NotSignedIn)?;
    print_user(&user)
}

async fn run_access(ctx: &CliContext, role: Option<Role>, fallback: Option<String>) -> Result<(), CliError> {
    ctx.session.initialize().await;
    let mut guard = role.map_or_else(RouteGuard::new, RouteGuard::requiring);
    if let Some(fallback) = fallback {
        guard = guard.with_fallback(fallback);
    }
    match guard.check(&ctx.session.snapshot()) {
        Access::Pending => println!("pending"),
        Access::Granted => println!("granted"),
        Access::Redirect(path) => println!("redirect {path}"),
    }
    Ok(())
}

fn print_user(user: &User) -> Result<(), CliError> {
    print_json(&serde_json::to_value(user)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
