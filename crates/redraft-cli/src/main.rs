//! Redraft CLI: transform email text from stdin through a hosted LLM.

use anyhow::{Context, Result};
use clap::Parser;
use redraft_config::{CliOverrides, RedraftConfig};
use redraft_gateway::GatewayClient;
use redraft_session::RequestSession;
use redraft_types::StreamEvent;
use std::io::{self, Read, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "redraft", version, about = "Transform email text with a hosted LLM")]
struct Cli {
    /// Transform to apply: revise, formal, casual, shorten, expand
    #[arg(default_value = "revise")]
    kind: String,

    /// Provider: openai, anthropic, google, deepseek, azure
    #[arg(long)]
    provider: Option<String>,

    /// Model override (provider default applies otherwise)
    #[arg(long)]
    model: Option<String>,

    /// System prompt override
    #[arg(long)]
    system_prompt: Option<String>,

    /// Email context prefixed ahead of the instruction
    #[arg(long)]
    context: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = RedraftConfig::load(CliOverrides {
        provider: cli.provider,
        model: cli.model,
        system_prompt: cli.system_prompt,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read email text from stdin")?;

    let gateway = GatewayClient::new().context("Failed to create HTTP client")?;
    let mut session = RequestSession::new(Arc::new(gateway), config.provider, config.credentials);
    session.set_model(config.model);
    session.set_system_prompt(config.system_prompt);
    if let Some(context) = cli.context {
        session.set_context(context);
    }

    // Ctrl-C cancels the in-flight request
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_signal.cancel();
        }
    });

    let mut stdout = io::stdout();
    session
        .run(&cli.kind, &input, cancel, |event| {
            if let StreamEvent::Delta { text } = event {
                let _ = write!(stdout, "{text}");
                let _ = stdout.flush();
            }
        })
        .await?;

    println!();
    Ok(())
}
