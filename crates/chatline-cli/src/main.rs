//! chatline — terminal client for the chatline chat server.
//!
//! Signs in over HTTP, keeps the session cookie in `~/.chatline`, and joins
//! the chat room over a WebSocket that reconnects on its own.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chatline_client::SessionStore;
use clap::{Parser, Subcommand};
use tracing::error;

/// chatline — chat client
#[derive(Parser, Debug)]
#[command(name = "chatline", version = "0.1.0", about = "Terminal client for the chatline chat server")]
struct Cli {
    /// Server base URL (overrides the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Sign in and store the session
    Login {
        /// Username (prompted for when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(short, long, conflicts_with = "guest")]
        password: Option<String>,

        /// Sign in as a guest
        #[arg(long)]
        guest: bool,
    },

    /// End the session and forget the stored cookie
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show whose turn it is
    Turn {
        /// Advance to the next turn
        #[arg(long)]
        next: bool,
    },

    /// Join the chat room (default)
    Chat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("chatline: {e:#}");
        std::process::exit(1);
    }
}

/// Without `--verbose` only the binary's own warnings show; channel outages
/// are reported by the chat command itself.
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "chatline=debug,chatline_cli=debug,chatline_client=debug,chatline_core=debug"
    } else {
        "chatline=warn,chatline_cli=warn"
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load config file.
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let cfg = config::Config::load(&config_path)?;

    // CLI overrides config.
    let server = cli.server.unwrap_or(cfg.server.url);
    let store = SessionStore::default_location().context("failed to locate session file")?;
    let ctx = commands::Context::open(&server, cfg.channel.reconnect_delay(), store)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Login {
            username,
            password,
            guest,
        } => commands::login::run(&ctx, username, password, guest).await,
        Command::Logout => commands::logout::run(&ctx).await,
        Command::Whoami => commands::whoami::run(&ctx).await,
        Command::Turn { next } => commands::turn::run(&ctx, next).await,
        Command::Chat => commands::chat::run(&ctx).await,
    }
}
