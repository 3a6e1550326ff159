use thiserror::Error;

use super::SupplyTerm;

/// Why a supply computation produced no snapshot. Every variant is fatal, there is no partial
/// result.
#[derive(Debug, Error)]
pub enum SupplyError {
    #[error("latest finalized epoch unavailable")]
    EpochUnavailable(#[source] anyhow::Error),
    /// Adapter errors and timeouts both land here, the timeout is then the source.
    #[error("required supply term {term} unavailable")]
    RequiredTermUnavailable {
        term: SupplyTerm,
        #[source]
        source: anyhow::Error,
    },
    /// The formula was evaluated without an input it needs.
    #[error("supply term {0} was not fetched")]
    TermNotFetched(SupplyTerm),
    #[error("{context} is negative ({value} wei), sources are inconsistent")]
    NegativeResult { context: String, value: String },
}

impl SupplyError {
    pub fn term(&self) -> Option<SupplyTerm> {
        match self {
            Self::RequiredTermUnavailable { term, .. } | Self::TermNotFetched(term) => Some(*term),
            Self::EpochUnavailable(_) | Self::NegativeResult { .. } => None,
        }
    }
}
