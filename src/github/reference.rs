// src/github/reference.rs
// =============================================================================
// Turns whatever the user typed into an owner/repo pair.
//
// Supported formats:
//   - owner/repo
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git/
//   - github.com/owner/repo/tree/main/src   (extra path segments are ignored)
//
// The parser never fails loudly: anything it cannot understand gives None,
// and the caller decides how to report it.
// =============================================================================

use url::Url;

use super::types::RepositoryIdentifier;

/// Hostname of the forge we talk to
pub const FORGE_HOST: &str = "github.com";

// Parses a repository reference
//
// Strategies, tried in order:
//   1. Strict "owner/repo"
//   2. Anything mentioning github.com is parsed as a URL (terminal: no fallback)
//   3. Any "a/b" with exactly two non-empty parts
//
// Example:
//   "https://github.com/rust-lang/rust" -> Some(rust-lang/rust)
pub fn parse_repository(input: &str) -> Option<RepositoryIdentifier> {
    let cleaned = normalize(input);

    if cleaned.is_empty() {
        return None;
    }

    if let Some(id) = parse_strict(cleaned) {
        return Some(id);
    }

    if cleaned.contains(FORGE_HOST) {
        return parse_forge_url(cleaned);
    }

    parse_loose(cleaned)
}

// Trims whitespace, then one trailing "/", then one trailing ".git"
//
// The slash goes first so that ".../react.git/" ends up as "react".
fn normalize(input: &str) -> &str {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.strip_suffix(".git").unwrap_or(trimmed)
}

fn parse_strict(input: &str) -> Option<RepositoryIdentifier> {
    let (owner, repo) = input.split_once('/')?;

    let owner_ok = !owner.is_empty()
        && owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    let repo_ok = !repo.is_empty()
        && repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if owner_ok && repo_ok {
        Some(RepositoryIdentifier::new(owner, repo))
    } else {
        None
    }
}

fn parse_forge_url(input: &str) -> Option<RepositoryIdentifier> {
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).ok()?;

    let host = url.host_str()?;
    if host != FORGE_HOST && host != "www.github.com" {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if repo.is_empty() {
        return None;
    }

    Some(RepositoryIdentifier::new(owner, repo))
}

fn parse_loose(input: &str) -> Option<RepositoryIdentifier> {
    let parts: Vec<&str> = input.split('/').collect();

    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Some(RepositoryIdentifier::new(*owner, *repo))
        }
        _ => None,
    }
}
