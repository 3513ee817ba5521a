use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::blocking::Client;
use tracing_subscriber::{fmt, EnvFilter};

mod snapshot;
mod summary;

#[derive(Parser, Debug)]
#[command(name = "hexis-watch", version, about = "Watch a Hexis agent through its dashboard service")]
struct Cli {
    /// Base URL of the dashboard service
    #[arg(long, env = "HEXIS_BASE", default_value = "http://127.0.0.1:8092")]
    base: String,
    /// Seconds between refreshes
    #[arg(long, default_value_t = 10)]
    interval_secs: u64,
    /// Print one snapshot and exit
    #[arg(long)]
    once: bool,
    /// Print the raw snapshot JSON instead of the summary
    #[arg(long)]
    json: bool,
    /// Request timeout (seconds)
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

impl Cli {
    fn base_url(&self) -> &str {
        self.base.trim_end_matches('/')
    }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("building HTTP client")
}

fn main() -> Result<()> {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let client = build_client(cli.timeout_secs)?;
    loop {
        let snap = snapshot::fetch(&client, cli.base_url());
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&snap).unwrap_or_else(|_| "{}".into())
            );
        } else {
            println!("{}", summary::render(&snap));
        }
        if cli.once {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(cli.interval_secs.max(1)));
    }
}
