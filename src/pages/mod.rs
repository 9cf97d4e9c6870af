//! Page Controllers
//!
//! Each controller owns its local UI state, calls the `ElectionApi`, and turns every
//! failure into a `Notification`. Controllers never render; they report what should
//! be shown next through a `Transition`.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ClientError, Result},
    routes::Route,
};

pub mod admin;
pub mod boundary;
pub mod login;
pub mod thank_you;
pub mod voting;

pub use admin::{AdminDashboard, Modal};
pub use boundary::{ErrorBoundary, FailureScreen};
pub use login::LoginPage;
pub use thank_you::ThankYouPage;
pub use voting::{VotingPage, VotingState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Notification
///
/// A transient, user-visible message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Transition
///
/// What a controller action results in: staying on the current page, or navigating to
/// another route. Either may carry a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay(Option<Notification>),
    Navigate(Route, Option<Notification>),
}

impl Transition {
    pub fn stay() -> Self {
        Transition::Stay(None)
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Transition::Stay(n) | Transition::Navigate(_, n) => n.as_ref(),
        }
    }

    pub fn route(&self) -> Option<Route> {
        match self {
            Transition::Navigate(route, _) => Some(*route),
            Transition::Stay(_) => None,
        }
    }

    /// Common reaction to an expired or missing session.
    pub(crate) fn back_to_login(error: &ClientError) -> Self {
        Transition::Navigate(
            Route::Login,
            Some(Notification::error("Session ended", error.to_string())),
        )
    }
}

/// Lifecycle
///
/// Teardown handle shared by a controller and whoever owns the view. Once torn down,
/// pending requests resolve to `ClientError::Cancelled` and their results are dropped
/// instead of being applied to a page that no longer exists.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `fut` unless the page is torn down first.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ClientError::Cancelled),
            result = fut => result,
        }
    }
}
