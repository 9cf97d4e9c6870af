use super::{Notification, Transition};
use crate::{
    api::ApiState,
    error::{ClientError, Result},
    models::Role,
    routes::Route,
    session::{Session, SessionContext},
};

const LOGIN_FAILED_TITLE: &str = "Login Failed";
const LOGIN_FAILED_MESSAGE: &str = "Invalid personal code or you have already voted.";
const SESSION_NOT_SAVED_MESSAGE: &str = "Your session could not be saved on this device.";

/// LoginPage
///
/// Collects the personal code, authenticates it, persists the session and picks the
/// landing route by role.
pub struct LoginPage {
    api: ApiState,
    session: SessionContext,
    personal_code: String,
}

impl LoginPage {
    pub fn new(api: ApiState, session: SessionContext) -> Self {
        Self {
            api,
            session,
            personal_code: String::new(),
        }
    }

    pub fn set_personal_code(&mut self, code: impl Into<String>) {
        self.personal_code = code.into();
    }

    pub fn personal_code(&self) -> &str {
        &self.personal_code
    }

    /// Admins land on the dashboard; every other role lands on the ballot.
    pub fn landing_route(role: Role) -> Route {
        match role {
            Role::Admin => Route::Admin,
            _ => Route::Voting,
        }
    }

    /// authenticate
    ///
    /// Typed form of `submit`: validates input, logs in and starts the session.
    /// An empty code is rejected without contacting the backend.
    pub async fn authenticate(&self) -> Result<Session> {
        let code = self.personal_code.trim();
        if code.is_empty() {
            return Err(ClientError::Validation(
                "personal code is required".to_string(),
            ));
        }

        let outcome = self.api.login(code).await?;
        Ok(self.session.begin(&outcome)?)
    }

    pub async fn submit(&mut self) -> Transition {
        if self.personal_code.trim().is_empty() {
            return Transition::Stay(Some(Notification::error(
                LOGIN_FAILED_TITLE,
                "Please enter your personal code.",
            )));
        }

        match self.authenticate().await {
            Ok(session) => Transition::Navigate(Self::landing_route(session.role), None),
            Err(e @ ClientError::Session(_)) => {
                tracing::error!(error = %e, "login succeeded but the session was not stored");
                Transition::Stay(Some(Notification::error(
                    LOGIN_FAILED_TITLE,
                    SESSION_NOT_SAVED_MESSAGE,
                )))
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                Transition::Stay(Some(Notification::error(
                    LOGIN_FAILED_TITLE,
                    LOGIN_FAILED_MESSAGE,
                )))
            }
        }
    }

    /// Ends the current session. Logging out without a session is a no-op.
    pub fn logout(&self) -> Result<Route> {
        self.session.end()?;
        Ok(Route::Login)
    }
}
