use thiserror::Error;

use crate::{routes::Route, session::SessionError};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// ClientError
///
/// The failure taxonomy shared by the API client, the route guard and the page controllers.
/// Every variant is eventually turned into a user-visible `Notification` at the controller
/// boundary, or into a `FailureScreen` by the `ErrorBoundary` if it escapes.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The login endpoint answered with a non-2xx status (invalid code or already voted).
    #[error("login rejected by server: {status} - {body}")]
    Auth { status: u16, body: String },

    #[error("no active session")]
    Unauthenticated,

    #[error("insufficient role for {route}")]
    Authorization { route: Route },

    /// A payload did not match the expected contract, or client-side input was rejected
    /// before any request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),

    #[error("server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("vote rejected by server: {status} - {body}")]
    Vote { status: u16, body: String },

    /// The stored token is no longer accepted. The session has already been cleared.
    #[error("session expired")]
    SessionExpired,

    #[error("operation cancelled")]
    Cancelled,

    #[error("session storage error: {0}")]
    Session(#[from] SessionError),
}

impl ClientError {
    /// True when the only sensible reaction is sending the user back to the login route.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthenticated
                | ClientError::Authorization { .. }
                | ClientError::SessionExpired
        )
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status, .. }
            | ClientError::Server { status, .. }
            | ClientError::Vote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
