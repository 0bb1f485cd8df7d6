mod capture;
mod correlate;
mod quote;
mod status;

use std::sync::Arc;

use serde_json::Value;
use tickvault_core::{CoreConfig, EastmoneyAdapter, MarketService, ReqwestHttpClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub exit_code: u8,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self { data, exit_code: 0 }
    }

    pub fn degraded(data: Value, exit_code: u8) -> Self {
        Self { data, exit_code }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    tracing::debug!(
        mock = cli.mock,
        data_dir = %cli.data_dir.display(),
        "dispatching command"
    );
    let service = build_service(cli);

    match &cli.command {
        Command::Status(args) => status::run(args, &service),
        Command::Quote(args) => quote::run(args, &service).await,
        Command::Correlate(args) => correlate::run(args, &service).await,
        Command::Capture(args) => capture::run(args, &service).await,
    }
}

fn build_service(cli: &Cli) -> MarketService {
    if cli.mock {
        return MarketService::in_memory(Arc::new(EastmoneyAdapter::default()));
    }

    let feed = Arc::new(EastmoneyAdapter::with_http_client(Arc::new(
        ReqwestHttpClient::new(),
    )));
    let config = CoreConfig {
        data_dir: cli.data_dir.clone(),
        fetch_timeout_ms: cli.timeout_ms,
        ..CoreConfig::default()
    };
    MarketService::new(&config, feed)
}
