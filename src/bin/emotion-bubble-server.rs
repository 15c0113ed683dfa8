// ABOUTME: Server binary for the Emotion Bubble journaling API and AI chat relay
// ABOUTME: Loads environment configuration, wires dependencies and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Emotion Bubble Server Binary
//!
//! Starts the HTTP API: notes, chat history, password login and the
//! streaming AI companion relay.

use anyhow::Result;
use clap::Parser;
use emotion_bubble::config::ServerConfig;
use emotion_bubble::context::ServerContext;
use emotion_bubble::{logging, server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "emotion-bubble-server")]
#[command(about = "Emotion Bubble - mood journaling API with a streaming AI companion")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind address
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!("Starting Emotion Bubble server");
    info!("{}", config.summary());

    let ctx = ServerContext::from_config(config)?;
    if let Err(e) = server::run(ctx).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
