use serde_json::json;
use tickvault_core::{InstrumentCode, MarketService, ResolveError};

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &QuoteArgs, service: &MarketService) -> Result<CommandResult, CliError> {
    let code = InstrumentCode::parse(&args.code)?;

    match service.resolve_quote(&code).await {
        Ok(resolved) => Ok(CommandResult::ok(serde_json::to_value(resolved)?)),
        Err(ResolveError::NoData { code }) => {
            let data = json!({
                "error": "no_data",
                "code": code,
                "message": "no live or cached data available",
            });
            Ok(CommandResult::degraded(data, 3))
        }
    }
}
