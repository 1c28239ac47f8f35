//! Error taxonomy for the decision layer.
//!
//! Only [`CoreError::InvalidAction`] and [`CoreError::InvalidPendingAction`]
//! are defects. Everything else the layer can hit - failed conditions,
//! rejected credentials, an unreachable backend, resolution misses - is an
//! expected branch expressed in the respective component's return type,
//! with a defined user-visible outcome.

use thiserror::Error;

use crate::backend::BackendError;
use crate::catalog::ActionId;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the dispatch pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Unknown action id - programmer error in the caller
    #[error("unknown action: {0}")]
    InvalidAction(ActionId),

    /// A pending action id with no registered capability - indicates a
    /// coordinator/catalog desync and should never occur in correct
    /// operation
    #[error("pending action is not registered: {0}")]
    InvalidPendingAction(ActionId),

    /// The backend could not serve the call; no partial mutation was
    /// applied
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CoreError {
    /// Whether this error indicates a configuration/programming defect
    /// rather than an operational condition.
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::InvalidAction(_) | Self::InvalidPendingAction(_))
    }
}

/// Errors from the authentication step.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend rejected the identifier/password pair
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend could not be asked
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defect_classification() {
        assert!(CoreError::InvalidAction(ActionId::from("x")).is_defect());
        assert!(CoreError::InvalidPendingAction(ActionId::from("x")).is_defect());
        assert!(!CoreError::Backend(BackendError::Unavailable("down".into())).is_defect());
    }

    #[test]
    fn display_messages() {
        let err = CoreError::InvalidAction(ActionId::from("course.fly"));
        assert_eq!(err.to_string(), "unknown action: course.fly");
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "invalid credentials");
    }
}
