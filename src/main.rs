// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) and load settings + stored token
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 2 = error)
// =============================================================================

mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - settings and the stored token
mod docs;          // src/docs/ - prompts, text generation, export
mod github;        // src/github/ - GitHub API client, tree building
mod session;       // src/session.rs - current repository/branch/tree state

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::File;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, TokenAction};
use config::{mask_token, CredentialStore, Settings};
use docs::{AnthropicGateway, DocContext, ExportFile, ExportFormat, DEFAULT_MAX_TOKENS};
use github::{find_node, flatten_files, render_tree, ForgeClient, ForgeError, TreeNode};
use session::{open_repository, switch_branch, Session};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            // Typed GitHub errors come with a suggestion for the user
            if let Some(hint) = e.downcast_ref::<ForgeError>().and_then(ForgeError::hint) {
                eprintln!("💡 {}", hint);
            }
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so they never mix with the documents we print
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let store = CredentialStore::default_location()?;
    let global = &cli.global;

    match cli.command {
        // Token management does not need a client
        Commands::Token { action } => handle_token(&store, &action),
        Commands::Tree { repo, branch, json } => {
            let (_, forge) = connect(global, &store)?;
            handle_tree(&forge, &repo, branch.as_deref(), json).await
        }
        Commands::Show { repo, path, branch } => {
            let (_, forge) = connect(global, &store)?;
            handle_show(&forge, &repo, &path, branch.as_deref()).await
        }
        Commands::Doc { repo, path, branch } => {
            let (settings, forge) = connect(global, &store)?;
            handle_doc(&forge, &settings, &repo, &path, branch.as_deref()).await
        }
        Commands::Architecture { repo, branch } => {
            let (settings, forge) = connect(global, &store)?;
            handle_architecture(&forge, &settings, &repo, branch.as_deref()).await
        }
        Commands::Export { repo, branch, format, output, paths } => {
            let (settings, forge) = connect(global, &store)?;
            handle_export(&forge, &settings, &repo, branch.as_deref(), format, &output, &paths).await
        }
    }
}

// Resolves flags + stored token and builds the GitHub client
fn connect(global: &cli::GlobalArgs, store: &CredentialStore) -> Result<(Settings, ForgeClient)> {
    let settings = Settings::resolve(global, store)?;
    let forge = ForgeClient::new(&settings.api_url, settings.token.as_deref())?;
    Ok((settings, forge))
}

// Opens the repository and, if asked, switches to another branch
async fn load(forge: &ForgeClient, repo: &str, branch: Option<&str>) -> Result<Session> {
    let mut session = Session::new();
    open_repository(forge, &mut session, repo).await?;

    if let Some(name) = branch {
        if session.branch().map(|b| b.name.as_str()) != Some(name) {
            switch_branch(forge, &mut session, name).await?;
        }
    }

    if session.is_truncated() {
        println!("⚠️  GitHub truncated the tree listing; only part of the repository is shown.");
    }
    Ok(session)
}

fn current_branch(session: &Session) -> Result<String> {
    session
        .branch()
        .map(|b| b.name.clone())
        .ok_or_else(|| anyhow!("Repository has no branches"))
}

fn doc_context<'a>(
    forge: &'a ForgeClient,
    gateway: &'a AnthropicGateway,
    settings: &'a Settings,
    session: &'a Session,
    branch: &'a str,
) -> Result<DocContext<'a>> {
    let repository = session
        .repository()
        .ok_or_else(|| anyhow!("No repository loaded"))?;

    Ok(DocContext {
        forge,
        gateway,
        repository,
        reference: branch,
        model: &settings.model,
        max_tokens: DEFAULT_MAX_TOKENS,
    })
}

async fn handle_tree(forge: &ForgeClient, repo: &str, branch: Option<&str>, json: bool) -> Result<()> {
    let session = load(forge, repo, branch).await?;
    let summary = session.summary().ok_or_else(|| anyhow!("No repository loaded"))?;

    if json {
        let output = serde_json::json!({
            "repository": summary,
            "branches": session.branches(),
            "branch": session.branch(),
            "truncated": session.is_truncated(),
            "tree": session.tree(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("📦 {}/{}", summary.owner, summary.name);
    if let Some(description) = &summary.description {
        println!("   {}", description);
    }
    println!("   ⭐ {}   🍴 {}", summary.stars, summary.forks);

    let branches: Vec<&str> = session.branches().iter().map(|b| b.name.as_str()).collect();
    println!("🌿 Branches: {}", branches.join(", "));
    if let Some(current) = session.branch() {
        println!("   Showing: {} ({})", current.name, short_sha(&current.commit_sha));
    }

    println!();
    print!("{}", render_tree(session.tree()));
    println!();
    println!("📄 {} file(s)", flatten_files(session.tree()).len());
    Ok(())
}

async fn handle_show(forge: &ForgeClient, repo: &str, path: &str, branch: Option<&str>) -> Result<()> {
    let mut session = load(forge, repo, branch).await?;
    match fetch_selected(forge, &mut session, path).await {
        Ok(text) => print!("{}", text),
        // Shown inline, like a file that simply has nothing to display
        Err(e) if matches!(e.downcast_ref::<ForgeError>(), Some(ForgeError::ContentUnavailable { .. })) => {
            println!("⚠️  {}", e)
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

// Reads one file of the loaded tree through the content fallback chain
async fn fetch_selected(forge: &ForgeClient, session: &mut Session, path: &str) -> Result<String> {
    let sha = selected_sha(session, path)?;
    let branch = current_branch(session)?;
    let repository = session
        .repository()
        .cloned()
        .ok_or_else(|| anyhow!("No repository loaded"))?;

    let ticket = session.begin_file(path);
    let text = forge
        .fetch_file_content(&repository, path, &branch, sha.as_deref())
        .await?;

    // Only trips when the session is shared between concurrent loads
    if !session.is_current_file(ticket) {
        return Err(anyhow!("Selection changed while '{}' was loading", path));
    }
    Ok(text)
}

// The blob SHA to fetch `path` with
//
// A truncated listing may be missing files that still exist; those are
// fetched by path alone (Ok(None)).
fn selected_sha(session: &Session, path: &str) -> Result<Option<String>> {
    match selected_file(session.tree(), path) {
        Ok(node) => Ok(Some(node.sha.clone())),
        Err(_) if session.is_truncated() && find_node(session.tree(), path).is_none() => {
            debug!(path, "not in truncated tree, fetching by path");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn selected_file<'a>(tree: &'a [TreeNode], path: &str) -> Result<&'a TreeNode> {
    let node = find_node(tree, path).ok_or_else(|| anyhow!("'{}' is not in the repository tree", path))?;
    if node.is_directory() {
        return Err(anyhow!("'{}' is a directory", path));
    }
    Ok(node)
}

async fn handle_doc(
    forge: &ForgeClient,
    settings: &Settings,
    repo: &str,
    path: &str,
    branch: Option<&str>,
) -> Result<()> {
    let session = load(forge, repo, branch).await?;
    let sha = selected_sha(&session, path)?;
    let branch = current_branch(&session)?;
    let gateway = AnthropicGateway::new(settings.gateway_key.clone())?;
    let ctx = doc_context(forge, &gateway, settings, &session, &branch)?;

    println!("📝 Generating documentation for {} ...\n", path);
    match ctx.document_file(path, sha.as_deref()).await {
        Ok(markdown) => println!("{}", markdown),
        // Shown in place of the documentation rather than as a failure
        Err(ForgeError::ContentUnavailable { path }) => {
            println!("⚠️  Could not load '{}': the file is too large or the API refused it.", path)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn handle_architecture(
    forge: &ForgeClient,
    settings: &Settings,
    repo: &str,
    branch: Option<&str>,
) -> Result<()> {
    let session = load(forge, repo, branch).await?;
    let summary = session.summary().ok_or_else(|| anyhow!("No repository loaded"))?;
    let branch = current_branch(&session)?;
    let gateway = AnthropicGateway::new(settings.gateway_key.clone())?;
    let ctx = doc_context(forge, &gateway, settings, &session, &branch)?;

    println!("🏗️  Summarizing architecture of {}/{} ...\n", summary.owner, summary.name);
    let text = docs::summarize_architecture(&ctx, summary, session.tree()).await;
    println!("{}", text);
    Ok(())
}

// Picks the files to export: everything, or what matches the given paths
//
// A path selects the file with that exact path, or every file below it when
// it names a directory.
fn select_export_files(tree: &[TreeNode], filters: &[String]) -> Vec<ExportFile> {
    flatten_files(tree)
        .into_iter()
        .filter(|node| {
            filters.is_empty()
                || filters.iter().any(|f| {
                    let f = f.trim_end_matches('/');
                    node.path == f || node.path.starts_with(&format!("{}/", f))
                })
        })
        .map(|node| ExportFile {
            path: node.path.clone(),
            sha: Some(node.sha.clone()),
        })
        .collect()
}

async fn handle_export(
    forge: &ForgeClient,
    settings: &Settings,
    repo: &str,
    branch: Option<&str>,
    format: ExportFormat,
    output: &std::path::Path,
    filters: &[String],
) -> Result<()> {
    let session = load(forge, repo, branch).await?;
    let files = select_export_files(session.tree(), filters);
    if files.is_empty() {
        println!("⚠️  No files matched; nothing to export");
        return Ok(());
    }

    let branch = current_branch(&session)?;
    let gateway = AnthropicGateway::new(settings.gateway_key.clone())?;
    let ctx = doc_context(forge, &gateway, settings, &session, &branch)?;

    println!("📚 Documenting {} file(s) one at a time...\n", files.len());
    let report = docs::run_export(&ctx, &files, |p| {
        let mark = if p.skipped { "⏭️ " } else { "✅" };
        println!("   {} [{}/{}] {}", mark, p.completed, p.total, p.path);
    })
    .await;

    // Whatever finished before an abort is still written out
    let archive_path = output.join(format!("{}.zip", docs::archive_root(ctx.repository)));
    if !report.documents.is_empty() {
        let file = File::create(&archive_path)
            .with_context(|| format!("Failed to create {}", archive_path.display()))?;
        docs::write_archive(file, ctx.repository, &report.documents, format)?;
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Documented: {}", report.documents.len());
    println!("   ⏭️  Skipped: {}", report.skipped.len());
    if report.documents.is_empty() {
        println!("   📦 Archive: not written (no documents)");
    } else {
        println!("   📦 Archive: {}", archive_path.display());
    }

    match report.aborted {
        Some(e) => {
            println!("   🛑 Stopped after {} of {} file(s)", report.documents.len() + report.skipped.len(), files.len());
            Err(e.into())
        }
        None => Ok(()),
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn handle_token(store: &CredentialStore, action: &TokenAction) -> Result<()> {
    match action {
        TokenAction::Set { token } => {
            store.save(token)?;
            println!("🔑 Token stored in {}", store.path().display());
        }
        TokenAction::Show => match store.load()? {
            Some(token) => println!("🔑 Stored token: {}", mask_token(&token)),
            None => println!("No token stored"),
        },
        TokenAction::Clear => {
            if store.clear()? {
                println!("🗑️  Token removed");
            } else {
                println!("No token stored");
            }
        }
    }
    Ok(())
}
