//! Session error types

use thiserror::Error;

/// Errors returned to callers of the session handle
///
/// These describe caller misuse or a closed actor. Collaborator failures
/// never appear here: they degrade to fallbacks inside the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session has not completed")]
    NotComplete,

    #[error("Reflection text is empty")]
    EmptyReflection,

    #[error("Reflection is already being submitted")]
    AlreadySubmitting,

    #[error("Reflection submission cancelled")]
    Cancelled,

    #[error("Session channel closed")]
    ChannelClosed,
}

/// Response from session operations
pub type SessionResponse<T> = Result<T, SessionError>;
