//! Login Server Entry Point
//!
//! Command line, configuration and runtime setup.
//! Uses `anyhow` for startup errors, but library errors are reported
//! through `kernel::error::AppError`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use auth::{
    AddUserInput, AddUserUseCase, AuthConfig, ChangePasswordInput, ChangePasswordUseCase,
};
use clap::{Parser, Subcommand};
use dispatch::{DispatchLoop, ServerConfig, ServerContext, TcpConnectionSource, shutdown};
use kernel::error::{
    app_error::{AppError, AppResult, ResultExt},
    kind::ErrorKind,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Allow-listed login server with a file-backed credential store
#[derive(Parser, Debug)]
#[command(name = "server", version, about)]
struct Cli {
    /// IP address to listen on
    #[arg(long, env = "SERVER_BIND_ADDR", default_value = "127.0.0.1")]
    bind_addr: String,

    /// TCP port to listen on
    #[arg(long, env = "SERVER_PORT", default_value_t = 9999)]
    port: u16,

    /// Pending-connection queue length
    #[arg(long, default_value_t = 5)]
    backlog: u32,

    /// Credential store file
    #[arg(long, env = "PASSWD_FILE", default_value = "passwd")]
    passwd_file: PathBuf,

    /// IP allow-list file, one address per line
    #[arg(long, env = "WHITELIST_FILE", default_value = "whitelist")]
    whitelist_file: PathBuf,

    /// Event log file
    #[arg(long, env = "SERVER_LOG_FILE", default_value = "server.log")]
    log_file: PathBuf,

    /// Failed logins before a connection is dropped
    #[arg(long, env = "MAX_LOGIN_ATTEMPTS", default_value_t = 3)]
    max_login_attempts: u32,

    /// Milliseconds between dispatch ticks
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 100)]
    tick_interval_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server until interrupted (default)
    Serve,
    /// Add a user; does nothing if the name is taken
    AddUser {
        name: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Change an existing user's password
    Passwd {
        name: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind_addr.clone(),
            port: self.port,
            backlog: self.backlog,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            log_file: self.log_file.clone(),
            auth: AuthConfig {
                passwd_file: self.passwd_file.clone(),
                whitelist_file: self.whitelist_file.clone(),
                max_login_attempts: self.max_login_attempts,
            },
            ..ServerConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,dispatch=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // The dispatch loop runs on a single thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_app_err(ErrorKind::Init, "Could not start the async runtime")?;

    let config = cli.server_config();
    runtime.block_on(async move {
        match cli.command {
            None | Some(Command::Serve) => serve(config).await,
            Some(Command::AddUser { name, password }) => add_user(config, name, password).await,
            Some(Command::Passwd { name, password }) => {
                change_password(config, name, password).await
            }
        }
    })
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let source = TcpConnectionSource::bind(&config.bind_addr, config.port, config.backlog)
        .map_err(AppError::from)?;
    let ctx = ServerContext::open(config).map_err(AppError::from)?;

    let (handle, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                handle.trigger();
            }
            Err(e) => {
                // keep the handle alive so the server runs on without signals
                tracing::error!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    DispatchLoop::new(source, ctx).run(shutdown).await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn add_user(
    config: ServerConfig,
    name: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = read_password(password).await?;
    let use_case = AddUserUseCase::new(Arc::new(config.auth.credential_store()));

    let output = use_case
        .execute(AddUserInput {
            user_name: name.clone(),
            password,
        })
        .await
        .map_err(AppError::from)?;

    if output.created {
        println!("Added user {name}");
    } else {
        println!("User {name} already exists, nothing changed");
    }
    Ok(())
}

async fn change_password(
    config: ServerConfig,
    name: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let new_password = read_password(password).await?;
    let use_case = ChangePasswordUseCase::new(Arc::new(config.auth.credential_store()));

    let output = use_case
        .execute(ChangePasswordInput {
            user_name: name.clone(),
            new_password,
        })
        .await
        .map_err(AppError::from)?;

    if !output.changed {
        bail!("No such user: {name}");
    }
    println!("Password changed for {name}");
    Ok(())
}

/// Use the given password, or read one line from stdin
async fn read_password(given: Option<String>) -> AppResult<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Password: ").await?;
    stderr.flush().await?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    if read == 0 {
        return Err(AppError::invalid_input("No password on stdin"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
