use serde::{Deserialize, Serialize};
use std::fmt;

// --- Identity ---

/// Role
///
/// The RBAC field carried by the session. Any value the backend sends that is not
/// `voter` or `admin` is kept as `Unknown` and treated as unprivileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Voter,
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Voter => "voter",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }

    /// Parses the persisted role string. Unrecognised values map to `Unknown`.
    pub fn parse(raw: &str) -> Role {
        match raw {
            "voter" => Role::Voter,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User
///
/// The identity resolved at login, either from the response's `user` object or from
/// the claims embedded in the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    pub id: i64,
    pub role: Role,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub personal_code: &'a str,
}

/// LoginResponse
///
/// Raw body of `POST /auth/login`. Every field is optional on the wire so the API
/// client can report a missing token as a typed validation failure instead of a
/// generic decode error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Authenticated login result handed to the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteRequest<'a> {
    pub candidate_ids: &'a [i64],
}

/// CandidateRequest
///
/// Body for creating or editing a candidate (POST /candidates, PUT /candidates/{id}).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CandidateRequest {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

impl From<&Candidate> for CandidateRequest {
    fn from(candidate: &Candidate) -> Self {
        Self {
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            image_url: candidate.image_url.clone(),
        }
    }
}

// --- Response Schemas ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CandidateStats {
    pub id: i64,
    pub name: String,
    pub votes: u64,
}

/// Stats
///
/// Server-computed tally returned by GET /candidates/stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_votes: u64,
    pub candidates: Vec<CandidateStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VoteStatus {
    pub has_voted: bool,
}
