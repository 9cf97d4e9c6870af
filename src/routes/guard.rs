use chrono::Utc;

use super::{Access, Route};
use crate::{
    error::{ClientError, Result},
    models::Role,
    session::{Session, SessionContext},
};

/// Navigation
///
/// Outcome of a guarded navigation attempt: either the requested route renders, or the
/// attempt ends in a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Navigation {
    /// The route that ends up on screen.
    pub fn route(&self) -> Route {
        match self {
            Navigation::Render(route) | Navigation::Redirect(route) => *route,
        }
    }
}

/// RouteGuard
///
/// Evaluates the two gates on every protected navigation:
/// 1. No token (or an expired one) redirects to login.
/// 2. An admin-only route with any role other than admin also redirects to login,
///    not to the voting page.
///
/// Advisory only: it keeps screens from being shown by accident. The token's validity
/// is decided by the backend.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionContext,
}

impl RouteGuard {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    /// authorize
    ///
    /// Returns the active session for protected routes (`None` for public ones), or the
    /// reason the route is denied.
    pub fn authorize(&self, route: Route) -> Result<Option<Session>> {
        self.authorize_at(route, Utc::now().timestamp())
    }

    /// Same as `authorize`, evaluated at a given Unix time.
    pub fn authorize_at(&self, route: Route, now: i64) -> Result<Option<Session>> {
        if route.access() == Access::Public {
            return Ok(None);
        }

        let session = self
            .session
            .current()?
            .ok_or(ClientError::Unauthenticated)?;

        if session.is_expired_at(now) {
            self.session.end()?;
            return Err(ClientError::SessionExpired);
        }

        if route.access() == Access::AdminOnly && session.role != Role::Admin {
            return Err(ClientError::Authorization { route });
        }

        Ok(Some(session))
    }

    pub fn navigate(&self, route: Route) -> Navigation {
        self.navigate_at(route, Utc::now().timestamp())
    }

    pub fn navigate_at(&self, route: Route, now: i64) -> Navigation {
        match self.authorize_at(route, now) {
            Ok(_) => Navigation::Render(route),
            Err(e) => {
                tracing::info!(route = %route, reason = %e, "navigation denied");
                Navigation::Redirect(Route::Login)
            }
        }
    }

    /// Guards a raw path. Unknown paths land on the login route.
    pub fn navigate_path(&self, path: &str) -> Navigation {
        match Route::parse(path) {
            Some(route) => self.navigate(route),
            None => {
                tracing::info!(path, "unknown route");
                Navigation::Redirect(Route::Login)
            }
        }
    }
}
