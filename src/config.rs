use directories::ProjectDirs;
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

/// Local development backend, used whenever `VOTE_API_URL` is unset outside production.
pub const DEFAULT_API_URL: &str = "http://localhost:3003/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const FALLBACK_SESSION_FILE: &str = ".school-vote-session.json";

/// AppConfig
///
/// Holds the client's entire configuration state. Loaded once at startup and immutable
/// afterwards; it is cloned into `AppState` and handed to the API client and controllers.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the election backend, without a trailing slash.
    pub api_url: String,
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Location of the persisted session slot (token + role).
    pub session_path: PathBuf,
    // Whether the voting page allows one or several candidates per ballot.
    pub voting_mode: VotingMode,
    // Upper bound for a single request. Requests are never retried.
    pub request_timeout: Duration,
}

/// Env
///
/// Defines the runtime context, used to switch between the local backend defaults
/// and a strictly configured production deployment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// VotingMode
///
/// `Single` keeps at most one candidate selected; `Multi` allows any non-empty set.
/// Both modes submit the selection as a list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum VotingMode {
    Single,
    #[default]
    Multi,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            env: Env::Local,
            session_path: PathBuf::from(FALLBACK_SESSION_FILE),
            voting_mode: VotingMode::Multi,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. In `Env::Production` the backend
    /// URL is mandatory; locally it falls back to `DEFAULT_API_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_url = match (env, env::var("VOTE_API_URL")) {
            (_, Ok(url)) => url,
            (Env::Production, Err(_)) => return Err(ConfigError::Missing("VOTE_API_URL")),
            (Env::Local, Err(_)) => DEFAULT_API_URL.to_string(),
        };
        let api_url = normalize_api_url(&api_url)?;

        let session_path = env::var("VOTE_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_path());

        let voting_mode = match env::var("VOTE_MODE") {
            Ok(mode) => parse_voting_mode(&mode)?,
            Err(_) => VotingMode::default(),
        };

        let request_timeout = match env::var("VOTE_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            env,
            session_path,
            voting_mode,
            request_timeout,
        })
    }
}

/// Validates the backend URL and strips trailing slashes so endpoint paths can be appended.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = reqwest::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        var: "VOTE_API_URL",
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            var: "VOTE_API_URL",
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn parse_voting_mode(raw: &str) -> Result<VotingMode, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "single" => Ok(VotingMode::Single),
        "multi" => Ok(VotingMode::Multi),
        other => Err(ConfigError::Invalid {
            var: "VOTE_MODE",
            reason: format!("expected 'single' or 'multi', got '{other}'"),
        }),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            var: "VOTE_REQUEST_TIMEOUT_SECS",
            reason: format!("expected a positive number of seconds, got '{raw}'"),
        }),
    }
}

fn default_session_path() -> PathBuf {
    ProjectDirs::from("org", "school-vote", "school-vote")
        .map(|dirs| dirs.data_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_SESSION_FILE))
}
