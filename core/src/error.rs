//! Error types for the request ledger.

use crate::id::RequestId;
use crate::params::UnbalancedParameters;
use thiserror::Error;

/// Errors returned by [`Ledger`](crate::ledger::Ledger) operations.
///
/// The first four variants are contract violations by the caller and are always
/// returned to the offending call. `Abandoned` means the request task died
/// without storing an outcome. `Transport` carries a failure reported by the
/// transport collaborator; it is only returned from a dispatch call when the
/// ledger's `throw_on_failure` option is set, and is recorded for later retrieval
/// either way.
///
/// # Type Parameters
///
/// - `E`: The transport's error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError<E> {
    /// Dispatch attempted with an identifier that is in flight or holds an
    /// unretrieved outcome.
    #[error("Request id already in use: {0}")]
    IdInUse(RequestId),

    /// Retrieval attempted while the request is still in flight.
    #[error("Request not complete: {0}")]
    RequestNotComplete(RequestId),

    /// Retrieval attempted on an identifier with no record (never dispatched, or
    /// already consumed).
    #[error("Invalid request: {0}")]
    InvalidRequest(RequestId),

    /// A flat parameter list had an odd number of tokens.
    #[error("Unbalanced parameters: expected name/value pairs, got {count} tokens")]
    UnbalancedParameters {
        /// Number of tokens supplied
        count: usize,
    },

    /// The request task ended before the transport settled (the transport
    /// panicked or the runtime shut down). No outcome was stored and the
    /// identifier is free again.
    #[error("Request abandoned before completion: {0}")]
    Abandoned(RequestId),

    /// The transport reported a failure.
    #[error("{0}")]
    Transport(E),
}

impl<E> LedgerError<E> {
    /// The identifier this error refers to, if any.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::IdInUse(id)
            | Self::RequestNotComplete(id)
            | Self::InvalidRequest(id)
            | Self::Abandoned(id) => Some(id),
            Self::UnbalancedParameters { .. } | Self::Transport(_) => None,
        }
    }

    /// Returns `true` for the structural errors raised by misuse of the ledger.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::Transport(_) | Self::Abandoned(_))
    }
}

impl<E> From<UnbalancedParameters> for LedgerError<E> {
    fn from(err: UnbalancedParameters) -> Self {
        Self::UnbalancedParameters { count: err.count }
    }
}
