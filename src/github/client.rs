// src/github/client.rs
// =============================================================================
// The GitHub REST API client.
//
// Layers:
// - Endpoint: an API path (segments + query) independent of the base URL
// - Transport: "GET this endpoint and give me JSON", with status codes
//   already classified into ForgeError
// - ForgeClient: the typed operations (summary, branches, tree, content)
//
// The Transport trait is the seam between our logic and the network.
// HttpTransport is the real implementation; tests plug in a scripted one.
//
// Rust concepts:
// - Trait objects (Arc<dyn Transport>): pick the implementation at runtime
// - BoxFuture: lets a trait method be async while staying object-safe
// =============================================================================

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::content::{fetch_content, ContentRequest};
use super::error::{classify_status, ForgeError};
use super::types::{
    Branch, RawBranch, RawRepository, RawTree, RepositoryIdentifier, RepositorySummary,
    TreeListing,
};

/// Default base URL of the public GitHub API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Versioned media type GitHub recommends for REST calls
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// An API path such as `/repos/rust-lang/rust/branches`
///
/// Segments are kept unencoded; the transport encodes them when it builds the
/// final URL. `Display` gives the readable form used in logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    fn repo(id: &RepositoryIdentifier) -> Self {
        Endpoint {
            segments: vec!["repos".to_string(), id.owner.clone(), id.repo.clone()],
            query: Vec::new(),
        }
    }

    fn segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    // A file path like "src/main.rs" becomes two segments, not one
    // segment with an encoded slash.
    fn path(mut self, path: &str) -> Self {
        self.segments
            .extend(path.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        self
    }

    fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn repository(id: &RepositoryIdentifier) -> Self {
        Self::repo(id)
    }

    pub fn branches(id: &RepositoryIdentifier) -> Self {
        Self::repo(id).segment("branches")
    }

    pub fn tree(id: &RepositoryIdentifier, sha: &str) -> Self {
        Self::repo(id)
            .segment("git")
            .segment("trees")
            .segment(sha)
            .query("recursive", "1")
    }

    pub fn contents(id: &RepositoryIdentifier, path: &str, reference: &str) -> Self {
        Self::repo(id)
            .segment("contents")
            .path(path)
            .query("ref", reference)
    }

    pub fn blob(id: &RepositoryIdentifier, sha: &str) -> Self {
        Self::repo(id).segment("git").segment("blobs").segment(sha)
    }

    /// Resolves this endpoint against a base URL like `https://api.github.com`
    pub fn to_url(&self, base: &Url) -> Result<Url, ForgeError> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ForgeError::Transport(format!("API base URL cannot be a base: {}", base))
            })?;
            segments.pop_if_empty();
            segments.extend(self.segments.iter().map(String::as_str));
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Future returned by [`Transport::get_json`]
pub type TransportFuture<'a> = BoxFuture<'a, Result<Value, ForgeError>>;

/// Performs GET requests against the forge API
///
/// Implementations must apply `classify_status` so that every caller sees the
/// same error for the same HTTP status.
pub trait Transport: Send + Sync {
    fn get_json<'a>(&'a self, endpoint: &'a Endpoint) -> TransportFuture<'a>;
}

/// The real network transport, built on reqwest
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    // Builds the reqwest client with our fixed headers
    //
    // Parameters:
    //   api_url: base URL, usually DEFAULT_API_URL
    //   token: optional bearer token; when None no Authorization header is sent
    pub fn new(api_url: &str, token: Option<&str>) -> anyhow::Result<Self> {
        let base = Url::parse(api_url)
            .map_err(|e| anyhow::anyhow!("Invalid API URL '{}': {}", api_url, e))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repo-scribe/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| anyhow::anyhow!("Token contains characters not allowed in a header"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base })
    }
}

impl Transport for HttpTransport {
    fn get_json<'a>(&'a self, endpoint: &'a Endpoint) -> TransportFuture<'a> {
        Box::pin(async move {
            let url = endpoint.to_url(&self.base)?;
            debug!(%url, "GET");

            let response = self.client.get(url).send().await?;
            classify_status(response.status())?;

            let body = response.json::<Value>().await?;
            Ok(body)
        })
    }
}

/// Typed access to the repository endpoints we need
#[derive(Clone)]
pub struct ForgeClient {
    transport: Arc<dyn Transport>,
}

impl ForgeClient {
    /// Creates a client that talks to the real API
    pub fn new(api_url: &str, token: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(api_url, token)?)))
    }

    /// Creates a client on top of any transport (used by tests)
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ForgeError> {
        let value = self.transport.get_json(endpoint).await?;
        serde_json::from_value(value).map_err(|e| {
            ForgeError::Payload(format!("{}: {}", endpoint, e))
        })
    }

    pub async fn fetch_repository_summary(
        &self,
        id: &RepositoryIdentifier,
    ) -> Result<RepositorySummary, ForgeError> {
        let raw: RawRepository = self.get(&Endpoint::repository(id)).await?;
        Ok(raw.into())
    }

    /// Returns branches in the order the API lists them
    pub async fn fetch_branches(&self, id: &RepositoryIdentifier) -> Result<Vec<Branch>, ForgeError> {
        let raw: Vec<RawBranch> = self.get(&Endpoint::branches(id)).await?;
        Ok(raw.into_iter().map(Branch::from).collect())
    }

    // Fetches the whole tree under a commit in one request
    //
    // Large repositories come back with `truncated: true`. That is not an
    // error: we keep the partial list and warn.
    pub async fn fetch_tree(
        &self,
        id: &RepositoryIdentifier,
        root_sha: &str,
    ) -> Result<TreeListing, ForgeError> {
        let raw: RawTree = self.get(&Endpoint::tree(id, root_sha)).await?;

        if raw.truncated {
            warn!(
                repository = %id,
                entries = raw.tree.len(),
                "tree listing was truncated by GitHub; showing a partial tree"
            );
        }

        Ok(TreeListing {
            entries: raw.tree,
            truncated: raw.truncated,
        })
    }

    /// Returns the text of one file, trying every content strategy in turn
    pub async fn fetch_file_content(
        &self,
        id: &RepositoryIdentifier,
        path: &str,
        reference: &str,
        sha: Option<&str>,
    ) -> Result<String, ForgeError> {
        let request = ContentRequest {
            repository: id.clone(),
            path: path.to_string(),
            reference: reference.to_string(),
            sha: sha.map(str::to_string),
        };
        fetch_content(self.transport.as_ref(), &request).await
    }
}

// -----------------------------------------------------------------------------
// Test support: a transport that answers from a script instead of the network
// -----------------------------------------------------------------------------

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why BoxFuture instead of `async fn` in the trait?
//    - A trait used as `dyn Transport` needs a concrete return type
//    - Box<dyn Future> gives every implementation the same return type
//
// 2. What is Arc<dyn Transport>?
//    - Arc = shared ownership, safe across threads
//    - Cloning ForgeClient only bumps a reference count
//
// 3. Why keep Endpoint segments unencoded?
//    - Tests compare readable strings like "/repos/o/r/contents/a b.md"
//    - Url::path_segments_mut() does the percent-encoding for the real request
// -----------------------------------------------------------------------------
