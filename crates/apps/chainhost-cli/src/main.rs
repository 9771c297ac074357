use anyhow::Context;
use chainhost_cli::bootstrap::{add_configured_chains, loopback_client, select_chain};
use chainhost_cli::config::CliConfig;
use chainhost_cli::session::{run_session, DEFAULT_DRAIN_GRACE};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;

/// Runs chains from a TOML chain list on the loopback engine and answers JSON-RPC read from
/// stdin, one request per line.
#[derive(Parser, Debug)]
#[command(name = "chainhost", version, about)]
struct Args {
    /// Configuration file path
    #[arg(long)]
    config: PathBuf,
    /// Chain receiving stdin requests; defaults to the last configured chain
    #[arg(long)]
    chain: Option<String>,
    /// Overrides `client.max_log_level` (0 = off, 5 = trace)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=5))]
    log_level: Option<u32>,
}

fn default_filter(max_log_level: u32) -> &'static str {
    match max_log_level {
        0 => "off",
        1 => "error",
        2 => "warn",
        3 => "info",
        4 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = CliConfig::from_path(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(level) = args.log_level {
        config.client.max_log_level = level;
    }
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(config.client.max_log_level)),
    )
    .init();

    let client = loopback_client(&config);
    let chains = add_configured_chains(&client, &config.chains).await?;
    let selected = select_chain(&chains, args.chain.as_deref())?;
    log::info!("forwarding stdin to chain '{}'", selected.name);

    let mut stdout = tokio::io::stdout();
    let summary =
        run_session(&selected.chain, BufReader::new(tokio::io::stdin()), &mut stdout, DEFAULT_DRAIN_GRACE)
            .await;

    let terminated = client.terminate().await;
    let summary = summary?;
    terminated.context("failed to terminate client")?;
    log::info!("{} request(s) sent, {} response(s) received", summary.sent, summary.received);
    Ok(())
}
