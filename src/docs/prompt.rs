// src/docs/prompt.rs
// =============================================================================
// Builds the prompts we send to the text generation service.
//
// Two kinds:
// - file documentation: one source file in, Markdown documentation out
// - architecture summary: repository metadata + file list in, overview out
//
// Large inputs are cut down so a single prompt stays within model limits.
// =============================================================================

use crate::github::{RepositoryIdentifier, RepositorySummary};

/// Characters of file content included in a documentation prompt
pub const MAX_FILE_CHARS: usize = 30_000;

/// File paths included in an architecture prompt
pub const MAX_LISTED_PATHS: usize = 400;

// Cuts text to at most `limit` chars (on a char boundary) and says so
fn clip(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

// Language hint for the fenced code block, from the file extension
fn fence_language(path: &str) -> &str {
    path.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.contains('/'))
        .unwrap_or("")
}

pub fn file_documentation_prompt(repo: &RepositoryIdentifier, path: &str, content: &str) -> String {
    let (body, clipped) = clip(content, MAX_FILE_CHARS);
    let note = if clipped {
        format!("\n(The file was truncated to its first {} characters.)\n", MAX_FILE_CHARS)
    } else {
        String::new()
    };

    format!(
        "You are a senior engineer writing documentation for the repository {repo}.\n\
         Document the file `{path}` in Markdown with these sections:\n\
         # Overview\n\
         ## Key Components\n\
         ## How It Works\n\
         ## Usage\n\
         ## Dependencies\n\
         Be concise and accurate; do not invent behavior that is not in the code.\n\
         {note}\n\
         ```{lang}\n{body}\n```\n",
        repo = repo,
        path = path,
        note = note,
        lang = fence_language(path),
        body = body,
    )
}

pub fn architecture_prompt(summary: &RepositorySummary, file_paths: &[&str]) -> String {
    let shown = file_paths.len().min(MAX_LISTED_PATHS);
    let mut listing = file_paths[..shown].join("\n");
    if file_paths.len() > shown {
        listing.push_str(&format!("\n... and {} more files", file_paths.len() - shown));
    }

    format!(
        "You are a software architect. Summarize the architecture of the repository \
         {owner}/{name}.\n\
         Description: {description}\n\
         Stars: {stars}, forks: {forks}, default branch: {branch}\n\n\
         Using the file layout below, write a Markdown overview covering:\n\
         # Architecture Overview\n\
         ## Main Components\n\
         ## Data Flow\n\
         ## Technologies\n\
         ## Where To Start Reading\n\n\
         Files:\n{listing}\n",
        owner = summary.owner,
        name = summary.name,
        description = summary.description.as_deref().unwrap_or("(none)"),
        stars = summary.stars,
        forks = summary.forks,
        branch = summary.default_branch,
        listing = listing,
    )
}
