use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth,
    config::AppConfig,
    error::{ClientError, Result},
    models::{
        Candidate, CandidateRequest, LoginOutcome, LoginRequest, LoginResponse, Stats,
        VoteRequest, VoteStatus,
    },
    session::SessionContext,
};

/// Backend paths, relative to `AppConfig::api_url`.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const CANDIDATES: &str = "/candidates";
    pub const CANDIDATE_STATS: &str = "/candidates/stats";
    pub const VOTE: &str = "/vote";
    pub const VOTE_STATUS: &str = "/vote/status";

    pub fn candidate(id: i64) -> String {
        format!("{CANDIDATES}/{id}")
    }
}

/// ElectionApi Trait
///
/// One method per backend capability, each mapped to exactly one outbound request.
/// Nothing is retried, queued or backed off: a failed call is surfaced and a retry
/// is always a fresh, user-initiated action.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn ElectionApi>`) shareable
/// between page controllers and swappable for stubs in controller tests.
#[async_trait]
pub trait ElectionApi: Send + Sync {
    // --- Authentication ---
    // Exchanges a personal code for a validated token and identity. Sent without Authorization.
    async fn login(&self, personal_code: &str) -> Result<LoginOutcome>;

    // --- Voter Reads ---
    async fn get_candidates(&self) -> Result<Vec<Candidate>>;
    async fn get_candidate_stats(&self) -> Result<Stats>;
    async fn check_vote_status(&self) -> Result<VoteStatus>;

    // --- Ballot ---
    // Always a list; single-vote mode sends a singleton.
    async fn vote(&self, candidate_ids: &[i64]) -> Result<()>;

    // --- Admin Mutations ---
    // No local role check: the backend enforces authorization.
    async fn add_candidate(&self, candidate: &CandidateRequest) -> Result<()>;
    async fn edit_candidate(&self, id: i64, candidate: &CandidateRequest) -> Result<()>;
    async fn delete_candidate(&self, id: i64) -> Result<()>;
    async fn remove_all_votes(&self) -> Result<()>;
}

/// ApiState
///
/// The concrete type used to share API access across page controllers.
pub type ApiState = Arc<dyn ElectionApi>;

/// Decides how a non-2xx status is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Login,
    Vote,
    Other,
}

/// HttpApiClient
///
/// The concrete `ElectionApi` backed by reqwest. Reads the bearer token from the
/// `SessionContext` while building each request; a 401 on any authorized call ends
/// the session and yields `ClientError::SessionExpired`.
#[derive(Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpApiClient {
    pub fn new(config: &AppConfig, session: SessionContext) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds an authorized request. The header is omitted when no session is stored,
    /// leaving the rejection to the backend.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self.http.request(method, self.url(path));
        Ok(match self.session.token()? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// dispatch
    ///
    /// Sends a prepared request inside an `api_request` span carrying a fresh request id,
    /// and converts transport failures and non-2xx statuses into the error taxonomy.
    async fn dispatch(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
        kind: CallKind,
    ) -> Result<Response> {
        let req_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %path,
            req_id = %req_id,
        );

        self.send(builder, req_id, kind).instrument(span).await
    }

    async fn send(&self, builder: RequestBuilder, req_id: Uuid, kind: CallKind) -> Result<Response> {
        let started = Instant::now();
        let response = builder
            .header("x-request-id", req_id.to_string())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "request failed in transport");
                ClientError::Network(e)
            })?;

        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && kind != CallKind::Login {
            tracing::warn!("token rejected, clearing session");
            self.session.end()?;
            return Err(ClientError::SessionExpired);
        }

        let status = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status, "request rejected");
        Err(match kind {
            CallKind::Login => ClientError::Auth { status, body },
            CallKind::Vote => ClientError::Vote { status, body },
            CallKind::Other => ClientError::Server { status, body },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.authorized(Method::GET, path)?;
        let response = self
            .dispatch(builder, Method::GET, path, CallKind::Other)
            .await?;
        decode_json(response).await
    }
}

/// Reads the full body and decodes it. A body that does not match the schema is a
/// contract violation, not a transport failure.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(ClientError::Network)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::Validation(format!("unexpected response body: {e}")))
}

#[async_trait]
impl ElectionApi for HttpApiClient {
    /// login
    ///
    /// A 2xx is not trusted on its own: the body must carry a non-empty `token`, and an
    /// identity must be resolvable from `user` or from the token's claims.
    async fn login(&self, personal_code: &str) -> Result<LoginOutcome> {
        let builder = self
            .http
            .post(self.url(endpoints::LOGIN))
            .json(&LoginRequest { personal_code });
        let response = self
            .dispatch(builder, Method::POST, endpoints::LOGIN, CallKind::Login)
            .await?;
        let body: LoginResponse = decode_json(response).await?;

        let token = body
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ClientError::Validation("login response lacks a token".to_string()))?;

        let user = match body.user {
            Some(user) => user,
            None => auth::decode_claims(&token)?.user(),
        };

        Ok(LoginOutcome { token, user })
    }

    async fn get_candidates(&self) -> Result<Vec<Candidate>> {
        self.get_json(endpoints::CANDIDATES).await
    }

    async fn get_candidate_stats(&self) -> Result<Stats> {
        self.get_json(endpoints::CANDIDATE_STATS).await
    }

    async fn check_vote_status(&self) -> Result<VoteStatus> {
        self.get_json(endpoints::VOTE_STATUS).await
    }

    async fn vote(&self, candidate_ids: &[i64]) -> Result<()> {
        if candidate_ids.is_empty() {
            return Err(ClientError::Validation(
                "at least one candidate must be selected".to_string(),
            ));
        }
        let builder = self
            .authorized(Method::POST, endpoints::VOTE)?
            .json(&VoteRequest { candidate_ids });
        self.dispatch(builder, Method::POST, endpoints::VOTE, CallKind::Vote)
            .await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: &CandidateRequest) -> Result<()> {
        let builder = self
            .authorized(Method::POST, endpoints::CANDIDATES)?
            .json(candidate);
        self.dispatch(builder, Method::POST, endpoints::CANDIDATES, CallKind::Other)
            .await?;
        Ok(())
    }

    async fn edit_candidate(&self, id: i64, candidate: &CandidateRequest) -> Result<()> {
        let path = endpoints::candidate(id);
        let builder = self.authorized(Method::PUT, &path)?.json(candidate);
        self.dispatch(builder, Method::PUT, &path, CallKind::Other)
            .await?;
        Ok(())
    }

    async fn delete_candidate(&self, id: i64) -> Result<()> {
        let path = endpoints::candidate(id);
        let builder = self.authorized(Method::DELETE, &path)?;
        self.dispatch(builder, Method::DELETE, &path, CallKind::Other)
            .await?;
        Ok(())
    }

    async fn remove_all_votes(&self) -> Result<()> {
        let builder = self.authorized(Method::DELETE, endpoints::VOTE)?;
        self.dispatch(builder, Method::DELETE, endpoints::VOTE, CallKind::Other)
            .await?;
        Ok(())
    }
}
