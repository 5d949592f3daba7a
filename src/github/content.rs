// src/github/content.rs
// =============================================================================
// Fetches the text of a single file, with a fallback.
//
// Strategy:
// - First ask /contents/{path}?ref=... (works for most files)
// - If that gives nothing usable, ask /git/blobs/{sha} (works for large files
//   where /contents returns an empty body)
// - If both come up empty, report ContentUnavailable
//
// A rate limit stops everything at once: trying another endpoint would only
// burn more quota and hide the real problem from the user.
//
// Rust concepts:
// - Trait objects in a slice: an ordered list of interchangeable strategies
// - base64 decoding and UTF-8 validation
// =============================================================================

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::client::{Endpoint, Transport};
use super::error::ForgeError;
use super::types::{RawContent, RepositoryIdentifier};

/// Everything needed to locate one file
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub repository: RepositoryIdentifier,
    pub path: String,
    /// Branch name or commit SHA to read from
    pub reference: String,
    /// Blob SHA from the tree listing, if known
    pub sha: Option<String>,
}

/// Outcome of one strategy that did not fail outright
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Content(String),
    NotApplicable,
}

/// One way of getting a file's content
pub trait ContentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt<'a>(
        &'a self,
        transport: &'a dyn Transport,
        request: &'a ContentRequest,
    ) -> BoxFuture<'a, Result<Attempt, ForgeError>>;
}

/// GET /repos/{owner}/{repo}/contents/{path}?ref={ref}
pub struct PathStrategy;

impl ContentStrategy for PathStrategy {
    fn name(&self) -> &'static str {
        "contents"
    }

    fn attempt<'a>(
        &'a self,
        transport: &'a dyn Transport,
        request: &'a ContentRequest,
    ) -> BoxFuture<'a, Result<Attempt, ForgeError>> {
        Box::pin(async move {
            let endpoint =
                Endpoint::contents(&request.repository, &request.path, &request.reference);
            let payload = transport.get_json(&endpoint).await?;

            // An array means the path is a directory
            if payload.is_array() {
                return Ok(Attempt::NotApplicable);
            }

            let raw = parse_content(payload)?;
            Ok(match raw.content.as_deref() {
                Some(encoded) if !encoded.is_empty() => decode_or_skip(encoded),
                _ => Attempt::NotApplicable,
            })
        })
    }
}

/// GET /repos/{owner}/{repo}/git/blobs/{sha}
pub struct BlobStrategy;

impl ContentStrategy for BlobStrategy {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn attempt<'a>(
        &'a self,
        transport: &'a dyn Transport,
        request: &'a ContentRequest,
    ) -> BoxFuture<'a, Result<Attempt, ForgeError>> {
        Box::pin(async move {
            let Some(sha) = request.sha.as_deref() else {
                return Ok(Attempt::NotApplicable);
            };

            let payload = transport
                .get_json(&Endpoint::blob(&request.repository, sha))
                .await?;
            let raw = parse_content(payload)?;

            Ok(match (raw.encoding.as_deref(), raw.content.as_deref()) {
                (Some("base64"), Some(encoded)) if !encoded.is_empty() => decode_or_skip(encoded),
                _ => Attempt::NotApplicable,
            })
        })
    }
}

/// The strategies in the order they are tried
pub fn default_strategies() -> [&'static dyn ContentStrategy; 2] {
    [&PathStrategy, &BlobStrategy]
}

// Runs the strategy chain for one file
//
// Returns:
//   Ok(text)                  as soon as one strategy produces content
//   Err(RateLimitExceeded)    immediately, without trying the rest
//   Err(ContentUnavailable)   when every strategy came up empty
//
// Other errors from a strategy (404, 5xx, odd payloads) just move on to the
// next strategy.
pub async fn fetch_content(
    transport: &dyn Transport,
    request: &ContentRequest,
) -> Result<String, ForgeError> {
    for strategy in default_strategies() {
        match strategy.attempt(transport, request).await {
            Ok(Attempt::Content(text)) => {
                debug!(path = %request.path, strategy = strategy.name(), "content fetched");
                return Ok(text);
            }
            Ok(Attempt::NotApplicable) => {
                debug!(path = %request.path, strategy = strategy.name(), "strategy not applicable");
            }
            Err(e) if e.is_rate_limit() => return Err(e),
            Err(e) => {
                debug!(path = %request.path, strategy = strategy.name(), error = %e, "strategy failed");
            }
        }
    }

    Err(ForgeError::ContentUnavailable {
        path: request.path.clone(),
    })
}

fn parse_content(payload: Value) -> Result<RawContent, ForgeError> {
    serde_json::from_value(payload).map_err(ForgeError::from)
}

fn decode_or_skip(encoded: &str) -> Attempt {
    match decode_content(encoded) {
        Some(text) => Attempt::Content(text),
        None => Attempt::NotApplicable,
    }
}

// Decodes GitHub's base64 content into text
//
// GitHub wraps its base64 at 60 columns, so whitespace is stripped first.
// Bytes that are not valid UTF-8 are returned as a byte-string (each byte
// becomes the char with the same code point) instead of failing.
//
// Returns None only if the base64 itself is broken.
pub fn decode_content(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64.decode(compact.as_bytes()).ok()?;

    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => Some(e.into_bytes().iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::testing::ScriptedTransport;
    use serde_json::json;

    const CONTENTS: &str = "/repos/octo/demo/contents/src/lib.rs?ref=main";
    const BLOB: &str = "/repos/octo/demo/git/blobs/b1";

    fn request(sha: Option<&str>) -> ContentRequest {
        ContentRequest {
            repository: RepositoryIdentifier::new("octo", "demo"),
            path: "src/lib.rs".to_string(),
            reference: "main".to_string(),
            sha: sha.map(str::to_string),
        }
    }

    fn encoded(text: &str) -> String {
        BASE64.encode(text)
    }

    #[test]
    fn test_decode_strips_line_breaks() {
        let wrapped = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(decode_content(wrapped), Some("hello world".to_string()));
    }

    #[test]
    fn test_decode_invalid_utf8_falls_back_to_bytes() {
        let raw = BASE64.encode([0x63u8, 0x61, 0x66, 0xE9]);
        assert_eq!(decode_content(&raw), Some("caf\u{e9}".to_string()));
    }

    #[test]
    fn test_decode_rejects_broken_base64() {
        assert_eq!(decode_content("!!!not base64"), None);
    }

    #[tokio::test]
    async fn test_path_strategy_succeeds_first() {
        let transport = ScriptedTransport::new().respond(
            CONTENTS,
            Ok(json!({ "type": "file", "encoding": "base64", "content": encoded("fn main() {}") })),
        );

        let text = fetch_content(&transport, &request(Some("b1"))).await.unwrap();
        assert_eq!(text, "fn main() {}");
        assert_eq!(transport.calls(), vec![CONTENTS.to_string()]);
    }

    #[tokio::test]
    async fn test_rate_limit_short_circuits_blob_fetch() {
        let transport = ScriptedTransport::new()
            .respond(CONTENTS, Err(ForgeError::RateLimitExceeded))
            .respond(BLOB, Ok(json!({ "encoding": "base64", "content": encoded("x") })));

        let err = fetch_content(&transport, &request(Some("b1"))).await.unwrap_err();
        assert_eq!(err, ForgeError::RateLimitExceeded);
        assert_eq!(transport.calls(), vec![CONTENTS.to_string()]);
    }

    #[tokio::test]
    async fn test_directory_payload_falls_through_to_blob() {
        let transport = ScriptedTransport::new()
            .respond(CONTENTS, Ok(json!([{ "name": "a.rs", "type": "file" }])))
            .respond(BLOB, Ok(json!({ "encoding": "base64", "content": encoded("from blob") })));

        let text = fetch_content(&transport, &request(Some("b1"))).await.unwrap();
        assert_eq!(text, "from blob");
        assert_eq!(transport.calls(), vec![CONTENTS.to_string(), BLOB.to_string()]);
    }

    #[tokio::test]
    async fn test_large_file_with_empty_content_uses_blob() {
        let transport = ScriptedTransport::new()
            .respond(CONTENTS, Ok(json!({ "encoding": "none", "content": "" })))
            .respond(BLOB, Ok(json!({ "encoding": "base64", "content": encoded("big") })));

        let text = fetch_content(&transport, &request(Some("b1"))).await.unwrap();
        assert_eq!(text, "big");
    }

    #[tokio::test]
    async fn test_not_found_then_blob_rate_limited() {
        let transport = ScriptedTransport::new()
            .respond(CONTENTS, Err(ForgeError::NotFoundOrPrivate))
            .respond(BLOB, Err(ForgeError::RateLimitExceeded));

        let err = fetch_content(&transport, &request(Some("b1"))).await.unwrap_err();
        assert_eq!(err, ForgeError::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_unavailable_without_sha() {
        let transport =
            ScriptedTransport::new().respond(CONTENTS, Ok(json!({ "content": "" })));

        let err = fetch_content(&transport, &request(None)).await.unwrap_err();
        assert_eq!(
            err,
            ForgeError::ContentUnavailable {
                path: "src/lib.rs".to_string()
            }
        );
        // No blob request is made without a SHA
        assert_eq!(transport.calls(), vec![CONTENTS.to_string()]);
    }

    #[tokio::test]
    async fn test_blob_without_base64_encoding_is_unavailable() {
        let transport = ScriptedTransport::new()
            .respond(CONTENTS, Err(ForgeError::Api { status: 500, text: "Internal Server Error".into() }))
            .respond(BLOB, Ok(json!({ "encoding": "utf-8", "content": "plain" })));

        let err = fetch_content(&transport, &request(Some("b1"))).await.unwrap_err();
        assert!(matches!(err, ForgeError::ContentUnavailable { .. }));
    }
}
