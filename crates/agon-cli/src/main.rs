//! Terminal frontend for arguing a claim before the remote judge.
//!
//! Reads commands from stdin, forwards them to a [`SessionController`],
//! and prints the session events that come back. One session per process:
//! the root claim is the positional argument, and the process exits when
//! the connection closes or the user quits.

#![deny(unsafe_code)]

mod repl;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use agon_client::session::{SessionCommand, SessionController, SessionEvent};
use agon_core::constants::{NAME, VERSION};
use agon_settings::load_settings;

#[derive(Debug, Parser)]
#[command(name = NAME, version = VERSION, about = "Argue a claim before a remote judge")]
struct Cli {
    /// The root claim to argue.
    statement: String,

    /// Judge WebSocket endpoint (overrides settings).
    #[arg(long)]
    endpoint: Option<String>,

    /// Log filter (overrides settings), e.g. `info` or `agon_client=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings().context("loading settings")?;
    if let Some(endpoint) = cli.endpoint {
        settings.connection.endpoint = endpoint;
    }
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }

    init_tracing(&settings.logging.level);
    debug!(endpoint = %settings.connection.endpoint, "starting session");

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    spawn_stdin_reader(command_tx);
    spawn_event_printer(event_rx);

    println!("arguing: {}", cli.statement);
    println!("type `help` for commands");

    let mut session = SessionController::new(
        settings.connection.endpoint.clone(),
        settings.connection.retry.clone(),
        cli.statement,
    );
    session.run(command_rx, event_tx).await?;

    println!("session over");
    Ok(())
}

/// Logs go to stderr so they interleave cleanly with the stdout repl.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn spawn_stdin_reader(commands: mpsc::UnboundedSender<SessionCommand>) {
    drop(tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match repl::parse_line(&line) {
                Ok(repl::Input::Command(command)) => {
                    let quitting = command == SessionCommand::Quit;
                    if commands.send(command).is_err() || quitting {
                        break;
                    }
                }
                Ok(repl::Input::Help) => repl::print_help(),
                Ok(repl::Input::Empty) => {}
                Err(message) => println!("! {message}"),
            }
        }
    }));
}

fn spawn_event_printer(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    drop(tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            repl::print_event(&event);
        }
    }));
}
