use tickvault_core::{CorrelationRequest, Indicator, InstrumentCode, MarketService};

use crate::cli::CorrelateArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CorrelateArgs, service: &MarketService) -> Result<CommandResult, CliError> {
    let code1 = InstrumentCode::parse(&args.code1)?;
    let code2 = InstrumentCode::parse(&args.code2)?;

    let indicators = args
        .indicators
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse::<Indicator>)
        .collect::<Result<Vec<_>, _>>()?;

    let request = CorrelationRequest::new(code1, code2, args.days, indicators)?;
    let result = service.compute_correlation(&request).await?;

    Ok(CommandResult::ok(serde_json::to_value(result)?))
}
