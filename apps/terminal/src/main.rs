mod ansi;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    direction_for_key, load_settings, ClientEvent, GameClient, GameHandle, SessionIdentity,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::ansi::AnsiSurface;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides `server_url` from the settings file.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    room_code: String,
    #[arg(long)]
    player_id: String,
    #[arg(long, default_value = "Player")]
    username: String,
    /// Settings file; `capture.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let identity = SessionIdentity::new(&args.room_code, &args.player_id, &args.username);
    let client = GameClient::connect(&settings, identity, Some(AnsiSurface::new()))
        .await
        .context("failed to join game")?;

    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::TrialStarted { trial, .. }) => info!(
                    trial_index = trial.trial_index,
                    my_role = %trial.my_role,
                    "trial started"
                ),
                Ok(ClientEvent::GameOver { results }) => {
                    info!(%results, "game over");
                }
                Ok(ClientEvent::ServerError(err)) => {
                    warn!(code = ?err.code, message = %err.message, "server error")
                }
                Ok(ClientEvent::Error(message)) => warn!(%message, "client error"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("move with w/a/s/d then enter; q quits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    'input: while let Some(line) = lines.next_line().await? {
        for ch in line.trim().chars() {
            if ch == 'q' || ch == 'Q' {
                break 'input;
            }
            let Some(direction) = direction_for_key(ch.encode_utf8(&mut [0; 4])) else {
                continue;
            };
            client.move_piece(direction).await?;
        }
    }

    client.shutdown().await.ok();
    Ok(())
}
