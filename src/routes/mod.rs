//! Route Table
//!
//! The four screens of the client and the access level each requires. Navigation to a
//! protected route goes through the `RouteGuard`; public routes always render.

use std::fmt;

pub mod guard;

pub use guard::{Navigation, RouteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`: personal code entry.
    Login,
    /// `/voting`: ballot for any authenticated session.
    Voting,
    /// `/admin`: candidate management and tallies, admin role only.
    Admin,
    /// `/thank-you`: terminal confirmation after a successful ballot.
    ThankYou,
}

/// Access
///
/// `Public` routes skip the guard, `Authenticated` needs a stored token, and `AdminOnly`
/// additionally needs the admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Voting => "/voting",
            Route::Admin => "/admin",
            Route::ThankYou => "/thank-you",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::ThankYou => Access::Public,
            Route::Voting => Access::Authenticated,
            Route::Admin => Access::AdminOnly,
        }
    }

    /// Resolves a path to a route. Trailing slashes are ignored; unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        [Route::Login, Route::Voting, Route::Admin, Route::ThankYou]
            .into_iter()
            .find(|route| route.path() == normalized)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
