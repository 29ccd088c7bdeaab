//! Observe error definitions.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while establishing an observe relation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    /// A required collaborator was not supplied.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The exchange already backs another relation.
    #[error("exchange {0} is already bound to an observe relation")]
    ExchangeInUse(Uuid),

    /// The request does not carry `observe = 0`.
    #[error("request for {0} is not an observe registration")]
    NotARegistration(String),
}

/// Result type for observe operations.
pub type ObserveResult<T> = Result<T, ObserveError>;
