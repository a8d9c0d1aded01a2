// Error types shared by the valuation and lineup modules.

use thiserror::Error;

/// Canonical and provider data cannot be reconciled. Never retried here;
/// the caller decides whether to abort the cycle.
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    #[error(
        "{count} {provider} record(s) could not be mapped to league players (first: \"{first}\")"
    )]
    UnmatchedProviderRecords {
        provider: String,
        count: usize,
        first: String,
    },

    #[error("roster {roster} references player id {player} missing from the league player set")]
    UnknownRosterPlayer { roster: String, player: String },
}

/// The league's slot configuration is unusable. Fatal, never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("starting slot `{label}` at index {index} has no lineup eligibility mapping")]
    UnmappedSlot { label: String, index: usize },
}

/// Failure modes of roster optimization.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
