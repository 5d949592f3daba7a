// src/github/mod.rs
// =============================================================================
// This module handles everything we read from GitHub.
//
// Submodules:
// - reference: turning user input into owner/repo
// - client: the REST client and its Transport seam
// - content: fetching one file's text with a fallback strategy
// - tree: rebuilding the directory hierarchy from a flat listing
// - types / error: shared data structures and the error taxonomy
// =============================================================================

mod client;
mod content;
mod error;
mod tree;
mod types;
mod reference;

pub use client::{ForgeClient, DEFAULT_API_URL};
pub use error::ForgeError;
pub use tree::{build_tree, find_node, flatten_files, render_tree, TreeNode};
pub use types::{Branch, EntryKind, RepositoryIdentifier, RepositorySummary, TreeEntry, TreeListing};
pub use reference::parse_repository;

#[cfg(test)]
pub use client::testing;
