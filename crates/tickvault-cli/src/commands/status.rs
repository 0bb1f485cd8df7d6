use serde::Serialize;
use tickvault_core::{MarketService, TradingDay};
use time::macros::format_description;
use time::Date;

use crate::cli::StatusArgs;
use crate::error::CliError;

use super::CommandResult;

/// Status for an explicit date: no session phase, since the query carries
/// no time of day.
#[derive(Debug, Serialize)]
struct DateStatusData {
    #[serde(flatten)]
    day: TradingDay,
    #[serde(with = "tickvault_core::domain::iso_date")]
    previous_trading_day: Date,
}

pub fn run(args: &StatusArgs, service: &MarketService) -> Result<CommandResult, CliError> {
    let data = match &args.date {
        Some(raw) => {
            let format = format_description!("[year]-[month]-[day]");
            let date = Date::parse(raw, &format)
                .map_err(|error| CliError::Command(format!("invalid --date '{raw}': {error}")))?;

            let day = service.calendar().trading_day(date);
            let previous_trading_day = service.calendar().previous_trading_day(date)?;
            serde_json::to_value(DateStatusData {
                day,
                previous_trading_day,
            })?
        }
        None => serde_json::to_value(service.trading_status()?)?,
    };

    Ok(CommandResult::ok(data))
}
