mod api;
mod client;
mod config;
mod confirm;
mod error;
mod harness;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use crate::client::HttpClient;
use crate::config::HarnessConfig;
use crate::confirm::{Confirm, StdinConfirm};
use crate::harness::AdminApiTester;

/// Smoke tests for the chat server admin HTTP API.
#[derive(Parser, Debug)]
#[command(name = "admin-api-tester")]
struct Args {
    /// Server base URL (default http://localhost:8083)
    #[arg(long)]
    url: Option<String>,

    /// Value of the X-Service-Key header
    #[arg(long)]
    service_key: Option<String>,

    /// JSON config file with base_url / service_key overrides
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

/// Warns about the development placeholder key and asks whether to proceed.
fn placeholder_key_confirmed(provider: &impl Confirm) -> bool {
    warn!("the service key is still the development placeholder");
    warn!("override it with --service-key or a --config file; the server reads SERVICE_MASTER_KEY");
    provider.confirm("continue with the default development key?")
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    let config = match HarnessConfig::resolve(args.url, args.service_key, args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    if config.uses_placeholder_key() && !placeholder_key_confirmed(&StdinConfirm) {
        return ExitCode::FAILURE;
    }

    let client = match HttpClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    info!("running admin API smoke tests against {}", config.base_url);
    let mut tester = AdminApiTester::new(client);
    tester.run_scenario().await;
    tester.print_summary();

    if tester.summary().failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
