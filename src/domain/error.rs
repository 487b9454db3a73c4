//! Ledger error types.
//!
//! Every failure is scoped to the single operation that raised it; none is
//! fatal, and a failed operation leaves prior state intact.

use super::trade::TradeId;

/// Top-level error type for tradelog.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("cannot merge trade {base} with trade {absorbed}: {reason}")]
    IncompatibleMerge {
        base: TradeId,
        absorbed: TradeId,
        reason: String,
    },

    #[error("trade {id} not found")]
    NotFound { id: TradeId },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) => 1,
            LedgerError::ConfigParse { .. } | LedgerError::ConfigMissing { .. } => 2,
            LedgerError::Store { .. } | LedgerError::StoreQuery { .. } => 3,
            LedgerError::InvalidInput { .. } => 4,
            LedgerError::IncompatibleMerge { .. } => 5,
            LedgerError::NotFound { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
