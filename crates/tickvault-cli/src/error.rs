use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickvault_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Calendar(#[from] tickvault_core::CalendarError),

    #[error(transparent)]
    Correlation(#[from] tickvault_core::CorrelationError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Correlation(_) => 2,
            Self::Calendar(_) => 4,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
