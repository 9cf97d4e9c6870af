#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use school_vote_client::{
    AppConfig, ClientError, ElectionApi, HttpApiClient, SessionContext,
    models::{Candidate, CandidateRequest, CandidateStats, LoginOutcome, Role, Stats, User, VoteStatus},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

// --- Fake Backend ---

pub const JWT_SECRET: &str = "fake-backend-secret-value";
pub const VOTER_CODE: &str = "1234";
pub const SECOND_VOTER_CODE: &str = "5678";
pub const ADMIN_CODE: &str = "9999";

#[derive(Debug, Serialize, Deserialize)]
pub struct FakeClaims {
    pub id: i64,
    pub role: String,
    pub exp: usize,
}

/// How the fake backend answers a successful login.
#[derive(Debug, Clone)]
pub enum LoginMode {
    /// `{token}` with a signed JWT carrying `{id, role, exp}`.
    Jwt,
    /// `{token, user}` with an opaque token.
    OpaqueWithUser,
    /// `{message}` only.
    MissingToken,
    /// `{token}` with a fixed token string.
    Fixed(String),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug)]
pub struct Backend {
    pub candidates: BTreeMap<i64, Candidate>,
    pub next_id: i64,
    // personal code -> (user id, role)
    pub accounts: HashMap<String, (i64, String)>,
    // voter id -> candidate ids
    pub ballots: HashMap<i64, Vec<i64>>,
    pub login_mode: LoginMode,
    pub requests: Vec<RecordedRequest>,
}

impl Default for Backend {
    fn default() -> Self {
        let candidates = [
            (1, "Alice", "Class president"),
            (2, "Bob", "Sports captain"),
            (3, "Carol", "Library rep"),
        ]
        .into_iter()
        .map(|(id, name, description)| {
            (
                id,
                Candidate {
                    id,
                    name: name.to_string(),
                    description: description.to_string(),
                    image_url: format!("https://img.example/{id}.png"),
                },
            )
        })
        .collect();

        let accounts = [
            (VOTER_CODE, 7, "voter"),
            (SECOND_VOTER_CODE, 8, "voter"),
            (ADMIN_CODE, 1, "admin"),
        ]
        .into_iter()
        .map(|(code, id, role)| (code.to_string(), (id, role.to_string())))
        .collect();

        Self {
            candidates,
            next_id: 4,
            accounts,
            ballots: HashMap::new(),
            login_mode: LoginMode::Jwt,
            requests: Vec::new(),
        }
    }
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct TestApp {
    /// Base API url, including the `/api` prefix.
    pub address: String,
    pub backend: Shared,
}

impl TestApp {
    pub fn config(&self) -> AppConfig {
        AppConfig {
            api_url: self.address.clone(),
            ..AppConfig::default()
        }
    }

    pub fn client(&self, session: SessionContext) -> HttpApiClient {
        HttpApiClient::new(&self.config(), session).expect("client builds")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.backend.lock().unwrap().requests.clone()
    }

    pub fn set_login_mode(&self, mode: LoginMode) {
        self.backend.lock().unwrap().login_mode = mode;
    }
}

/// Signs a token valid for `ttl_secs` (negative for an already expired one).
pub fn issue_token(id: i64, role: &str, ttl_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = FakeClaims {
        id,
        role: role.to_string(),
        exp: (now as i64 + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Backend::default()).await
}

pub async fn spawn_app_with(backend: Backend) -> TestApp {
    let backend = Arc::new(Mutex::new(backend));

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/candidates", get(list_candidates).post(add_candidate))
        .route("/candidates/stats", get(candidate_stats))
        .route("/candidates/{id}", put(edit_candidate).delete(delete_candidate))
        .route("/vote", post(cast_vote).delete(remove_all_votes))
        .route("/vote/status", get(vote_status));

    let router = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .layer(TraceLayer::new_for_http())
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}/api", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, backend }
}

/// Address with nothing listening behind it.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

async fn record(State(backend): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = {
        let headers = request.headers();
        let header_value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization: header_value(header::AUTHORIZATION.as_str()),
            request_id: header_value("x-request-id"),
        }
    };
    backend.lock().unwrap().requests.push(recorded);
    next.run(request).await
}

fn authenticate(headers: &HeaderMap) -> Result<(i64, String), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let data = decode::<FakeClaims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok((data.claims.id, data.claims.role))
}

fn require_admin(headers: &HeaderMap) -> Result<(), StatusCode> {
    match authenticate(headers)? {
        (_, role) if role == "admin" => Ok(()),
        _ => Err(StatusCode::FORBIDDEN),
    }
}

#[derive(Deserialize)]
struct LoginBody {
    personal_code: String,
}

async fn login(State(backend): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let backend = backend.lock().unwrap();
    let Some((id, role)) = backend.accounts.get(&body.personal_code).cloned() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid personal code" })),
        )
            .into_response();
    };

    if role == "voter" && backend.ballots.contains_key(&id) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Already voted" })),
        )
            .into_response();
    }

    let body = match &backend.login_mode {
        LoginMode::Jwt => json!({ "token": issue_token(id, &role, 3600) }),
        LoginMode::OpaqueWithUser => json!({
            "token": format!("opaque-{id}"),
            "user": { "id": id, "role": role },
        }),
        LoginMode::MissingToken => json!({ "message": "ok" }),
        LoginMode::Fixed(token) => json!({ "token": token }),
    };
    Json(body).into_response()
}

async fn list_candidates(
    State(backend): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<Candidate>>, StatusCode> {
    authenticate(&headers)?;
    let backend = backend.lock().unwrap();
    Ok(Json(backend.candidates.values().cloned().collect()))
}

async fn candidate_stats(
    State(backend): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Stats>, StatusCode> {
    authenticate(&headers)?;
    let backend = backend.lock().unwrap();
    let mut tally: HashMap<i64, u64> = HashMap::new();
    for id in backend.ballots.values().flatten() {
        *tally.entry(*id).or_default() += 1;
    }
    let candidates: Vec<CandidateStats> = backend
        .candidates
        .values()
        .map(|c| CandidateStats {
            id: c.id,
            name: c.name.clone(),
            votes: tally.get(&c.id).copied().unwrap_or(0),
        })
        .collect();
    Ok(Json(Stats {
        total_votes: candidates.iter().map(|c| c.votes).sum(),
        candidates,
    }))
}

async fn vote_status(
    State(backend): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<VoteStatus>, StatusCode> {
    let (id, _) = authenticate(&headers)?;
    let backend = backend.lock().unwrap();
    Ok(Json(VoteStatus {
        has_voted: backend.ballots.contains_key(&id),
    }))
}

#[derive(Deserialize)]
struct VoteBody {
    candidate_ids: Vec<i64>,
}

async fn cast_vote(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<VoteBody>,
) -> Response {
    let (id, _) = match authenticate(&headers) {
        Ok(identity) => identity,
        Err(status) => return status.into_response(),
    };
    let mut backend = backend.lock().unwrap();
    if backend.ballots.contains_key(&id) {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Already voted" }))).into_response();
    }
    if body.candidate_ids.is_empty()
        || body
            .candidate_ids
            .iter()
            .any(|c| !backend.candidates.contains_key(c))
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid candidate" })),
        )
            .into_response();
    }
    backend.ballots.insert(id, body.candidate_ids);
    Json(json!({ "message": "Vote recorded" })).into_response()
}

async fn remove_all_votes(State(backend): State<Shared>, headers: HeaderMap) -> StatusCode {
    if let Err(status) = require_admin(&headers) {
        return status;
    }
    backend.lock().unwrap().ballots.clear();
    StatusCode::OK
}

async fn add_candidate(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CandidateRequest>,
) -> Result<(StatusCode, Json<Candidate>), StatusCode> {
    require_admin(&headers)?;
    let mut backend = backend.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    let candidate = Candidate {
        id,
        name: body.name,
        description: body.description,
        image_url: body.image_url,
    };
    backend.candidates.insert(id, candidate.clone());
    Ok((StatusCode::CREATED, Json(candidate)))
}

async fn edit_candidate(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<CandidateRequest>,
) -> Result<Json<Candidate>, StatusCode> {
    require_admin(&headers)?;
    let mut backend = backend.lock().unwrap();
    let candidate = backend
        .candidates
        .get_mut(&id)
        .ok_or(StatusCode::NOT_FOUND)?;
    candidate.name = body.name;
    candidate.description = body.description;
    candidate.image_url = body.image_url;
    Ok(Json(candidate.clone()))
}

async fn delete_candidate(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> StatusCode {
    if let Err(status) = require_admin(&headers) {
        return status;
    }
    let mut backend = backend.lock().unwrap();
    match backend.candidates.remove(&id) {
        Some(_) => {
            backend.ballots.values_mut().for_each(|b| b.retain(|c| *c != id));
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

// --- Stub API for controller tests ---

#[derive(Debug, Default)]
pub struct StubState {
    pub candidates: Vec<Candidate>,
    pub stats: Stats,
    pub has_voted: bool,
    // operation name -> HTTP status to fail with
    pub failures: HashMap<&'static str, u16>,
    pub calls: Vec<&'static str>,
    pub ballots: Vec<Vec<i64>>,
    pub delay: Option<Duration>,
}

/// In-memory `ElectionApi` recording every call. No network involved.
#[derive(Debug, Default)]
pub struct StubApi {
    pub state: Mutex<StubState>,
}

impl StubApi {
    pub fn with_candidates(names: &[&str]) -> Arc<Self> {
        let candidates: Vec<Candidate> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Candidate {
                id: i as i64 + 1,
                name: name.to_string(),
                ..Candidate::default()
            })
            .collect();
        let stats = Stats {
            total_votes: 0,
            candidates: candidates
                .iter()
                .map(|c| CandidateStats {
                    id: c.id,
                    name: c.name.clone(),
                    votes: 0,
                })
                .collect(),
        };
        Arc::new(Self {
            state: Mutex::new(StubState {
                candidates,
                stats,
                ..StubState::default()
            }),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    pub fn fail(&self, op: &'static str, status: u16) {
        self.state.lock().unwrap().failures.insert(op, status);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failures.remove(op);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    async fn enter(&self, op: &'static str) -> Result<(), ClientError> {
        let (failure, delay) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op);
            (state.failures.get(op).copied(), state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            None => Ok(()),
            Some(401) => Err(ClientError::SessionExpired),
            Some(status) if op == "vote" => Err(ClientError::Vote {
                status,
                body: String::new(),
            }),
            Some(status) => Err(ClientError::Server {
                status,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl ElectionApi for StubApi {
    async fn login(&self, personal_code: &str) -> Result<LoginOutcome, ClientError> {
        self.enter("login").await?;
        let role = if personal_code == ADMIN_CODE {
            Role::Admin
        } else {
            Role::Voter
        };
        Ok(LoginOutcome {
            token: format!("stub-{personal_code}"),
            user: User { id: 1, role },
        })
    }

    async fn get_candidates(&self) -> Result<Vec<Candidate>, ClientError> {
        self.enter("get_candidates").await?;
        Ok(self.state.lock().unwrap().candidates.clone())
    }

    async fn get_candidate_stats(&self) -> Result<Stats, ClientError> {
        self.enter("get_candidate_stats").await?;
        Ok(self.state.lock().unwrap().stats.clone())
    }

    async fn check_vote_status(&self) -> Result<VoteStatus, ClientError> {
        self.enter("check_vote_status").await?;
        Ok(VoteStatus {
            has_voted: self.state.lock().unwrap().has_voted,
        })
    }

    async fn vote(&self, candidate_ids: &[i64]) -> Result<(), ClientError> {
        self.enter("vote").await?;
        let mut state = self.state.lock().unwrap();
        state.ballots.push(candidate_ids.to_vec());
        state.has_voted = true;
        Ok(())
    }

    async fn add_candidate(&self, candidate: &CandidateRequest) -> Result<(), ClientError> {
        self.enter("add_candidate").await?;
        let mut state = self.state.lock().unwrap();
        let id = state.candidates.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        state.candidates.push(Candidate {
            id,
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            image_url: candidate.image_url.clone(),
        });
        Ok(())
    }

    async fn edit_candidate(&self, id: i64, candidate: &CandidateRequest) -> Result<(), ClientError> {
        self.enter("edit_candidate").await?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.candidates.iter_mut().find(|c| c.id == id) {
            existing.name = candidate.name.clone();
            existing.description = candidate.description.clone();
            existing.image_url = candidate.image_url.clone();
        }
        Ok(())
    }

    async fn delete_candidate(&self, id: i64) -> Result<(), ClientError> {
        self.enter("delete_candidate").await?;
        let mut state = self.state.lock().unwrap();
        state.candidates.retain(|c| c.id != id);
        state.stats.candidates.retain(|c| c.id != id);
        Ok(())
    }

    async fn remove_all_votes(&self) -> Result<(), ClientError> {
        self.enter("remove_all_votes").await?;
        let mut state = self.state.lock().unwrap();
        state.stats.total_votes = 0;
        state.stats.candidates.iter_mut().for_each(|c| c.votes = 0);
        Ok(())
    }
}
