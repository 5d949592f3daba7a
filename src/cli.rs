// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Global flags (token, API URL, model) can also come from environment
// variables, thanks to clap's `env` feature.
// =============================================================================

use clap::{Args, Parser, Subcommand};

use crate::docs::{ExportFormat, DEFAULT_MODEL};
use crate::github::DEFAULT_API_URL;

#[derive(Parser, Debug)]
#[command(
    name = "repo-scribe",
    version,
    about = "Browse GitHub repositories and generate documentation for them",
    long_about = "repo-scribe reads a GitHub repository's branches, tree and files, then asks a \
                  text generation model to document individual files or summarize the \
                  architecture. Results can be exported as a zip of Markdown or HTML files."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// GitHub token (overrides the stored one)
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, global = true, env = "REPO_SCRIBE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Model used for documentation
    #[arg(long, global = true, env = "REPO_SCRIBE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API key for the text generation service
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a repository's summary, branches and file tree
    ///
    /// Example: repo-scribe tree rust-lang/rust
    Tree {
        /// Repository: owner/repo or a GitHub URL
        repo: String,

        /// Branch to show (defaults to the repository's default branch)
        #[arg(long)]
        branch: Option<String>,

        /// Output as JSON instead of a drawing
        #[arg(long)]
        json: bool,
    },

    /// Print the content of one file
    ///
    /// Example: repo-scribe show tokio-rs/tokio README.md
    Show {
        repo: String,
        path: String,
        #[arg(long)]
        branch: Option<String>,
    },

    /// Generate documentation for one file
    Doc {
        repo: String,
        path: String,
        #[arg(long)]
        branch: Option<String>,
    },

    /// Generate an architecture summary of the whole repository
    Architecture {
        repo: String,
        #[arg(long)]
        branch: Option<String>,
    },

    /// Document many files and package them as a zip archive
    ///
    /// Example: repo-scribe export octo/demo --path src --format html
    Export {
        repo: String,

        #[arg(long)]
        branch: Option<String>,

        /// Output format of each document
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Directory the archive is written to
        #[arg(long, short, default_value = ".")]
        output: std::path::PathBuf,

        /// Files or directories to include (repeatable); everything if omitted
        #[arg(long = "path")]
        paths: Vec<String>,
    },

    /// Manage the stored GitHub token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Store a token for later runs
    Set { token: String },
    /// Show whether a token is stored (masked)
    Show,
    /// Remove the stored token
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_command() {
        let cli = Cli::parse_from(["repo-scribe", "tree", "octo/demo", "--branch", "dev"]);
        match cli.command {
            Commands::Tree { repo, branch, json } => {
                assert_eq!(repo, "octo/demo");
                assert_eq!(branch.as_deref(), Some("dev"));
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_defaults() {
        let cli = Cli::parse_from(["repo-scribe", "export", "octo/demo", "--path", "src", "--path", "README.md"]);
        match cli.command {
            Commands::Export { format, paths, output, .. } => {
                assert_eq!(format, ExportFormat::Markdown);
                assert_eq!(paths, vec!["src", "README.md"]);
                assert_eq!(output, std::path::PathBuf::from("."));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_html_format_and_global_flags() {
        let cli = Cli::parse_from([
            "repo-scribe", "export", "octo/demo", "--format", "html", "-vv", "--api-url", "http://localhost:1",
        ]);
        assert!(matches!(cli.command, Commands::Export { format: ExportFormat::Html, .. }));
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.api_url, "http://localhost:1");
    }

    #[test]
    fn test_parse_token_actions() {
        let cli = Cli::parse_from(["repo-scribe", "token", "set", "abc"]);
        assert!(matches!(
            cli.command,
            Commands::Token { action: TokenAction::Set { ref token } } if token == "abc"
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
