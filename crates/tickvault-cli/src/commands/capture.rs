use tickvault_core::{InstrumentCode, MarketService};

use crate::cli::CaptureArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CaptureArgs, service: &MarketService) -> Result<CommandResult, CliError> {
    let codes = args
        .codes
        .iter()
        .map(|raw| InstrumentCode::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let report = service.capture_snapshots(&codes).await;
    let exit_code = if report.recorded.is_empty() && !report.failed.is_empty() {
        3
    } else {
        0
    };

    Ok(CommandResult::degraded(
        serde_json::to_value(report)?,
        exit_code,
    ))
}
