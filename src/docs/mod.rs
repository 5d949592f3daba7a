// src/docs/mod.rs
// =============================================================================
// This module produces documentation from repository content.
//
// Submodules:
// - gateway: the text generation service (trait + live Anthropic adapter)
// - prompt: what we ask the model
// - export: sequential bulk generation and zip packaging
// - html: the small Markdown -> HTML converter used by the HTML export
// =============================================================================

mod export;
mod gateway;
mod html;
mod prompt;

pub use export::{
    archive_root, run_export, write_archive, DocContext, ExportFile, ExportFormat, ExportProgress,
};
pub use gateway::{AnthropicGateway, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

use crate::github::{flatten_files, RepositorySummary, TreeNode};
use gateway::generate_or_notice;

// Asks for an architecture overview of the whole repository
//
// Only the file layout and metadata are sent, not file contents.
pub async fn summarize_architecture(
    ctx: &DocContext<'_>,
    summary: &RepositorySummary,
    tree: &[TreeNode],
) -> String {
    let paths: Vec<&str> = flatten_files(tree).iter().map(|n| n.path.as_str()).collect();
    let prompt = prompt::architecture_prompt(summary, &paths);
    generate_or_notice(ctx.gateway, &ctx.request(prompt)).await
}

#[cfg(test)]
pub use gateway::testing;
