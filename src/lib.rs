use std::sync::Arc;

// --- Module Structure ---

// Core client services and components.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod session;

// Screen-level modules: navigation gates and the page controllers behind them.
pub mod pages;
pub mod routes;

// --- Public Re-exports ---

// Makes core state types easily accessible to the binary entry point (main.rs).
pub use api::{ApiState, ElectionApi, HttpApiClient};
pub use config::{AppConfig, Env, VotingMode};
pub use error::{ClientError, Result};
pub use routes::{Navigation, Route, RouteGuard};
pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionState};

/// AppState
///
/// Implements the **Unified State Pattern** on the client side: one container holding the
/// API client, the session lifecycle object, the route guard and the immutable configuration.
/// The API client and the guard share the same `SessionContext`, handed to them at construction.
#[derive(Clone)]
pub struct AppState {
    /// API Layer: one request per backend capability.
    pub api: ApiState,
    /// Session Layer: the persisted token + role slot.
    pub session: SessionContext,
    /// Navigation gate for protected routes.
    pub guard: RouteGuard,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state around the on-disk session slot configured in `config`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(config.session_path.clone())) as SessionState;
        Self::with_session(config, SessionContext::new(store))
    }

    /// Builds the state around an explicit session context (e.g. an in-memory one).
    pub fn with_session(config: AppConfig, session: SessionContext) -> Result<Self> {
        let api = Arc::new(HttpApiClient::new(&config, session.clone())?) as ApiState;
        Ok(Self {
            api,
            guard: RouteGuard::new(session.clone()),
            session,
            config,
        })
    }

    pub fn login_page(&self) -> pages::LoginPage {
        pages::LoginPage::new(self.api.clone(), self.session.clone())
    }

    pub fn voting_page(&self) -> pages::VotingPage {
        pages::VotingPage::new(self.api.clone(), self.config.voting_mode)
    }

    pub fn admin_dashboard(&self) -> pages::AdminDashboard {
        pages::AdminDashboard::new(self.api.clone())
    }
}
