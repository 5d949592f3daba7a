// src/github/types.rs
// =============================================================================
// Data structures for the repository pieces we read from GitHub.
//
// There are two layers here:
// - Raw* structs mirror the JSON GitHub sends (only the fields we use)
// - The public structs are our own, flatter view of that data
//
// Keeping them apart means a change in the API payload only touches the
// `From` conversions below, not the rest of the program.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// An owner/repo pair, e.g. `rust-lang/rust`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentifier {
    pub owner: String,
    pub repo: String,
}

impl RepositoryIdentifier {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepositoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Snapshot of a repository's metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub default_branch: String,
}

/// A branch and the commit it currently points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit_sha: String,
}

/// What kind of object a tree entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A file
    Blob,
    /// A directory
    Tree,
    /// A submodule (points at a commit in another repository)
    Commit,
}

impl EntryKind {
    pub fn is_directory(self) -> bool {
        self == EntryKind::Tree
    }
}

/// One flat entry of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, kind: EntryKind, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            sha: sha.into(),
            size: None,
        }
    }
}

/// The result of a recursive tree fetch
///
/// `truncated` is set when the repository was too large for one response;
/// `entries` then only holds part of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    pub truncated: bool,
}

// -----------------------------------------------------------------------------
// Raw API payloads
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RawOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRepository {
    pub name: String,
    pub owner: RawOwner,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub default_branch: String,
}

impl From<RawRepository> for RepositorySummary {
    fn from(raw: RawRepository) -> Self {
        RepositorySummary {
            owner: raw.owner.login,
            name: raw.name,
            description: raw.description,
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            default_branch: raw.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommitRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBranch {
    pub name: String,
    pub commit: RawCommitRef,
}

impl From<RawBranch> for Branch {
    fn from(raw: RawBranch) -> Self {
        Branch {
            name: raw.name,
            commit_sha: raw.commit.sha,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTree {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// Payload of both `/contents/{path}` (for a file) and `/git/blobs/{sha}`
#[derive(Debug, Deserialize)]
pub(crate) struct RawContent {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}
