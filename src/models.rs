// src/models.rs
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{RelayError, Result};

/// Shown when the remote rejected a submission without saying why.
pub const GENERIC_SERVER_ERROR: &str = "Server error. Please try again later.";

/// Shown when no response could be obtained from the remote at all.
pub const CONNECTIVITY_ERROR: &str =
    "Unable to reach the server. Please check your connection and try again.";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern is valid"));

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote understood the request and declined it.
    RemoteRejection,
    /// No usable response was obtained.
    TransportFailure,
    /// The submitted fields never left this service.
    InvalidInput,
}

/// Outcome of a submission or a listing fetch, ready to hand to a renderer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResult<T> {
    Success { payload: T },
    Failure { kind: FailureKind, message: String },
}

impl<T> SubmissionResult<T> {
    pub fn success(payload: T) -> Self {
        SubmissionResult::Success { payload }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        SubmissionResult::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Folds an error into the user-displayable failure shape.
    pub fn from_error(err: &RelayError) -> Self {
        match err {
            RelayError::RemoteRejection { message, .. } => {
                let message = message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(GENERIC_SERVER_ERROR);
                Self::failure(FailureKind::RemoteRejection, message)
            }
            RelayError::Validation { .. } => Self::failure(FailureKind::InvalidInput, err.to_string()),
            other => Self::failure(other.failure_kind(), CONNECTIVITY_ERROR),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            SubmissionResult::Success { payload } => Some(payload),
            SubmissionResult::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionResult::Success { .. } => None,
            SubmissionResult::Failure { message, .. } => Some(message),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            SubmissionResult::Success { .. } => None,
            SubmissionResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SubmissionResult<U> {
        match self {
            SubmissionResult::Success { payload } => SubmissionResult::Success {
                payload: f(payload),
            },
            SubmissionResult::Failure { kind, message } => SubmissionResult::Failure { kind, message },
        }
    }
}

impl<T> From<Result<T>> for SubmissionResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::from_error(&e),
        }
    }
}

/// A user record as confirmed by the remote API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Any other fields the remote chose to echo back.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            extra: serde_json::Map::new(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Registration fields that have passed local validation.
///
/// The only way to get one is through [`RegistrationForm::new`], so the
/// submission handler never sees an empty required field.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RegistrationForm {
    name: String,
    email: String,
}

impl RegistrationForm {
    pub fn new(name: &str, email: &str) -> Result<Self> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(RelayError::Validation {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if email.is_empty() {
            return Err(RelayError::Validation {
                field: "email",
                reason: "must not be empty".to_string(),
            });
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(RelayError::Validation {
                field: "email",
                reason: format!("'{}' is not an email address", email),
            });
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Pagination and search parameters, passed through to the remote untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    /// Key under which the rendering for this query is cached.
    /// Variants of a view share the `tag?` prefix so one invalidation reaches all of them.
    pub fn cache_key(&self, tag: &str) -> String {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(format!("page={}", page));
        }
        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(search) = &self.search {
            params.push(format!("search={}", search));
        }

        if params.is_empty() {
            tag.to_string()
        } else {
            format!("{}?{}", tag, params.join("&"))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserListing {
    pub users: Vec<User>,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}
