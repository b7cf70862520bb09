//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gatehouse_core::auth::{self, AuthBackend};
use gatehouse_core::config::{self, BackendKind};
use gatehouse_core::{interrupt, logging};
use tracing::debug;

mod commands;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(version)]
#[command(about = "Sign in, sign up and manage your session from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Auth backend to use (hosted or memory), overriding the config file
    #[arg(long, global = true, value_name = "BACKEND")]
    backend: Option<BackendKind>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the interactive sign-in UI (default)
    Ui,
    /// Show whether a session is active
    Status,
    /// Sign in (password is read from stdin)
    Login {
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// Create an account (password is read from stdin)
    Signup {
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// Email a password reset link
    ResetPassword {
        /// Account email
        #[arg(long)]
        email: String,
        /// Where the emailed link sends the user
        #[arg(long, value_name = "URL")]
        redirect_url: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    interrupt::init()?;

    // Logging is best effort: a read-only home must not block sign-in.
    let _log_guard = logging::init(&config::paths::logs_dir()).ok();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, backend } = cli;

    // Config commands must work before a backend is configured.
    let connect = || -> Result<(config::Config, Arc<dyn AuthBackend>)> {
        let mut config = config::Config::load().context("load config")?;
        if let Some(kind) = backend {
            config.backend = kind;
        }
        debug!(backend = %config.backend, "resolved backend");
        let auth = auth::build_backend(&config)?;
        Ok((config, auth))
    };

    match command.unwrap_or(Commands::Ui) {
        Commands::Ui => {
            let (config, auth) = connect()?;
            commands::ui::run(&config, auth).await
        }
        Commands::Status => {
            let (_, auth) = connect()?;
            commands::session::status(auth.as_ref()).await
        }
        Commands::Login { email } => {
            let (_, auth) = connect()?;
            commands::session::login(auth.as_ref(), &email).await
        }
        Commands::Signup { email } => {
            let (_, auth) = connect()?;
            commands::session::signup(auth.as_ref(), &email).await
        }
        Commands::ResetPassword {
            email,
            redirect_url,
        } => {
            let (config, auth) = connect()?;
            let redirect_url = redirect_url.or_else(|| config.effective_reset_redirect());
            commands::session::reset_password(auth.as_ref(), &email, redirect_url).await
        }
        Commands::Logout => {
            let (_, auth) = connect()?;
            commands::session::logout(auth.as_ref()).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
