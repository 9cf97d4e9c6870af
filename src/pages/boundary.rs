use std::{fmt, future::Future};

pub const FAILURE_TITLE: &str = "Oops, something went wrong";
pub const FAILURE_ACTION: &str = "Reload page";
const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// FailureScreen
///
/// Generic failure view shown when an error escapes every controller. It offers a single
/// reload action; it is the last line of defense, not a recovery mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureScreen {
    pub title: &'static str,
    pub message: String,
    pub action: &'static str,
}

impl FailureScreen {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            title: FAILURE_TITLE,
            message: if message.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message
            },
            action: FAILURE_ACTION,
        }
    }
}

impl fmt::Display for FailureScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n[{}]", self.title, self.message, self.action)
    }
}

/// ErrorBoundary
///
/// Top-level catch-all around a unit of work. Runs it on its own task so both returned
/// errors and panics end up as a `FailureScreen` instead of tearing down the caller.
pub struct ErrorBoundary;

impl ErrorBoundary {
    pub async fn run<F, T, E>(work: F) -> Result<T, FailureScreen>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        match tokio::spawn(work).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "uncaught error");
                Err(FailureScreen::new(e.to_string()))
            }
            Err(join_error) => {
                tracing::error!(error = %join_error, "task aborted");
                Err(FailureScreen::new(FALLBACK_MESSAGE))
            }
        }
    }
}
