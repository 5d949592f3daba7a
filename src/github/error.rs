// src/github/error.rs
// =============================================================================
// Error types for everything that talks to the GitHub API.
//
// Every HTTP response goes through `classify_status` so that the same status
// code always turns into the same error, no matter which endpoint produced it.
//
// Rust concepts:
// - thiserror: derive macro that implements std::error::Error for our enum
// - Enums with data: variants can carry the details of what went wrong
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while reading a repository from GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// The user input could not be turned into an owner/repo pair
    #[error("could not recognize a GitHub repository in '{0}'")]
    UnrecognizedRepository(String),

    /// A branch name that is not in the repository's branch list
    #[error("branch '{0}' does not exist in this repository")]
    UnknownBranch(String),

    /// HTTP 403 or 429
    #[error("GitHub API rate limit exceeded")]
    RateLimitExceeded,

    /// HTTP 404 (GitHub also answers 404 for private repos without access)
    #[error("repository or path not found (it may be private)")]
    NotFoundOrPrivate,

    /// HTTP 401
    #[error("bad credentials: the GitHub token was rejected")]
    BadCredentials,

    /// Any other non-2xx status
    #[error("GitHub API error: {status} {text}")]
    Api { status: u16, text: String },

    /// Every content strategy was tried and none produced the file
    #[error("content of '{path}' is unavailable (file too large or API limit)")]
    ContentUnavailable { path: String },

    /// The request never got a response (DNS, TLS, timeout, ...)
    #[error("request failed: {0}")]
    Transport(String),

    /// The response arrived but did not have the shape we expected
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl ForgeError {
    /// True for the one error that must stop every fallback immediately.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ForgeError::RateLimitExceeded)
    }

    /// A follow-up suggestion to show the user next to the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ForgeError::RateLimitExceeded => Some(
                "Unauthenticated requests are heavily rate limited. \
                 Store a token with `repo-scribe token set <TOKEN>` or pass --token.",
            ),
            ForgeError::BadCredentials => Some(
                "Check your token, then update it with `repo-scribe token set <TOKEN>` \
                 or remove it with `repo-scribe token clear`.",
            ),
            ForgeError::NotFoundOrPrivate => {
                Some("Private repositories need a token with read access.")
            }
            ForgeError::UnrecognizedRepository(_) => {
                Some("Use 'owner/repo' or a https://github.com/owner/repo URL.")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(error: reqwest::Error) -> Self {
        ForgeError::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(error: serde_json::Error) -> Self {
        ForgeError::Payload(error.to_string())
    }
}

// Maps an HTTP status to our error taxonomy
//
// Returns Ok(()) for 2xx so callers can simply write `classify_status(s)?;`
//
// Note: 403 counts as a rate limit even when the quota headers say otherwise.
// GitHub uses 403 for secondary rate limits without always setting them.
pub fn classify_status(status: StatusCode) -> Result<(), ForgeError> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(ForgeError::RateLimitExceeded),
        StatusCode::NOT_FOUND => Err(ForgeError::NotFoundOrPrivate),
        StatusCode::UNAUTHORIZED => Err(ForgeError::BadCredentials),
        other => Err(ForgeError::Api {
            status: other.as_u16(),
            text: other.canonical_reason().unwrap_or("Unknown").to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses_pass() {
        assert_eq!(classify_status(StatusCode::OK), Ok(()));
        assert_eq!(classify_status(StatusCode::NO_CONTENT), Ok(()));
    }

    #[test]
    fn test_rate_limit_statuses() {
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Err(ForgeError::RateLimitExceeded)
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Err(ForgeError::RateLimitExceeded)
        );
    }

    #[test]
    fn test_not_found_and_unauthorized() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Err(ForgeError::NotFoundOrPrivate)
        );
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            Err(ForgeError::BadCredentials)
        );
    }

    #[test]
    fn test_other_status_carries_code_and_text() {
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            Err(ForgeError::Api {
                status: 502,
                text: "Bad Gateway".to_string()
            })
        );
    }

    #[test]
    fn test_hints() {
        assert!(ForgeError::RateLimitExceeded.hint().unwrap().contains("token set"));
        assert!(ForgeError::BadCredentials.hint().is_some());
        assert!(ForgeError::Payload("x".into()).hint().is_none());
    }
}
