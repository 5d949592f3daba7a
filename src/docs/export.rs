// src/docs/export.rs
// =============================================================================
// Bulk documentation export.
//
// How it works:
// 1. For each selected file, one at a time:
//    fetch its content -> generate documentation -> report progress
// 2. Package every generated document into a zip archive:
//      <repo>-docs/src_main.rs.md
//      <repo>-docs/README.md.md
//
// Files are processed strictly in sequence. Both GitHub and the text
// generation API rate limit us, and parallel requests would hit those limits
// almost immediately on a repository of any size.
//
// A file whose content cannot be fetched is skipped. Any other GitHub error
// (rate limit, bad token, ...) would fail every remaining file too, so it
// stops the export. Documents generated before that point are kept in the
// report and still get archived.
// =============================================================================

use anyhow::Result;
use std::collections::HashSet;
use std::io::{Seek, Write};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::gateway::{generate_or_notice, GenerationRequest, TextGateway};
use super::html::render_page;
use super::prompt::file_documentation_prompt;
use crate::github::{ForgeClient, ForgeError, RepositoryIdentifier};

/// Output flavor of the exported documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    #[value(name = "md")]
    Markdown,
    #[value(name = "html")]
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }
}

/// A file selected for export: its path and blob SHA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub path: String,
    pub sha: Option<String>,
}

/// Generated documentation for one source file (always Markdown)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDoc {
    pub path: String,
    pub markdown: String,
}

/// Progress after each file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    pub completed: usize,
    pub total: usize,
    pub path: String,
    pub skipped: bool,
}

/// Everything an export produced
///
/// `aborted` holds the error that stopped the export early, if any.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub documents: Vec<GeneratedDoc>,
    pub skipped: Vec<String>,
    pub aborted: Option<ForgeError>,
}

/// Shared inputs for generating documentation
pub struct DocContext<'a> {
    pub forge: &'a ForgeClient,
    pub gateway: &'a dyn TextGateway,
    pub repository: &'a RepositoryIdentifier,
    /// Branch name the files are read from
    pub reference: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
}

impl DocContext<'_> {
    pub fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            model: self.model.to_string(),
            prompt,
            max_tokens: self.max_tokens,
        }
    }

    // Fetch one file and document it
    //
    // Fetch errors are returned; generation failures come back as a notice
    // inside the Markdown instead.
    pub async fn document_file(&self, path: &str, sha: Option<&str>) -> Result<String, ForgeError> {
        let content = self
            .forge
            .fetch_file_content(self.repository, path, self.reference, sha)
            .await?;

        let prompt = file_documentation_prompt(self.repository, path, &content);
        Ok(generate_or_notice(self.gateway, &self.request(prompt)).await)
    }
}

// Documents every file in order, calling `progress` after each one
//
// Never fails as a whole: an aborting error is recorded in the report next
// to whatever was finished before it.
pub async fn run_export<F>(
    ctx: &DocContext<'_>,
    files: &[ExportFile],
    mut progress: F,
) -> ExportReport
where
    F: FnMut(&ExportProgress),
{
    let mut report = ExportReport::default();
    let total = files.len();

    for (index, file) in files.iter().enumerate() {
        let skipped = match ctx.document_file(&file.path, file.sha.as_deref()).await {
            Ok(markdown) => {
                report.documents.push(GeneratedDoc {
                    path: file.path.clone(),
                    markdown,
                });
                false
            }
            Err(ForgeError::ContentUnavailable { path }) => {
                warn!(%path, "skipping file: content unavailable");
                report.skipped.push(path);
                true
            }
            Err(e) => {
                warn!(path = %file.path, error = %e, "export stopped");
                report.aborted = Some(e);
                return report;
            }
        };

        progress(&ExportProgress {
            completed: index + 1,
            total,
            path: file.path.clone(),
            skipped,
        });
    }

    info!(
        documents = report.documents.len(),
        skipped = report.skipped.len(),
        "export finished"
    );
    report
}

/// Archive entry name for a source path, e.g. "src/main.rs" -> "src_main.rs.md"
pub fn document_file_name(path: &str, format: ExportFormat) -> String {
    format!("{}.{}", path.replace('/', "_"), format.extension())
}

// Entry names are unique within one archive
//
// Flattening can make two paths collide ("a/b_c.rs" and "a_b/c.rs" both
// become "a_b_c.rs.md"); later ones get " (2)", " (3)", ... before the
// extension.
fn unique_file_name(path: &str, format: ExportFormat, used: &mut HashSet<String>) -> String {
    let mut name = document_file_name(path, format);
    let stem = path.replace('/', "_");
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{} ({}).{}", stem, n, format.extension());
        n += 1;
    }
    used.insert(name.clone());
    name
}

/// Top-level folder inside the archive
pub fn archive_root(repository: &RepositoryIdentifier) -> String {
    format!("{}-docs", repository.repo)
}

// Writes the documents as a zip archive into `writer`
//
// Works with any Write + Seek target: a File in the CLI, a Cursor in tests.
pub fn write_archive<W: Write + Seek>(
    writer: W,
    repository: &RepositoryIdentifier,
    documents: &[GeneratedDoc],
    format: ExportFormat,
) -> Result<W> {
    let root = archive_root(repository);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(writer);
    zip.add_directory(format!("{}/", root), options)?;

    let mut used = HashSet::new();
    for doc in documents {
        let name = format!("{}/{}", root, unique_file_name(&doc.path, format, &mut used));
        let body = match format {
            ExportFormat::Markdown => doc.markdown.clone(),
            ExportFormat::Html => render_page(&doc.path, &doc.markdown),
        };

        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::gateway::testing::CannedGateway;
    use crate::github::testing::ScriptedTransport;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde_json::json;
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    fn repo() -> RepositoryIdentifier {
        RepositoryIdentifier::new("octo", "demo")
    }

    fn file(path: &str, sha: &str) -> ExportFile {
        ExportFile {
            path: path.to_string(),
            sha: Some(sha.to_string()),
        }
    }

    fn content(text: &str) -> serde_json::Value {
        json!({ "encoding": "base64", "content": BASE64.encode(text) })
    }

    #[test]
    fn test_document_file_name() {
        assert_eq!(document_file_name("src/main.rs", ExportFormat::Markdown), "src_main.rs.md");
        assert_eq!(document_file_name("README.md", ExportFormat::Html), "README.md.html");
    }

    #[test]
    fn test_archive_layout_markdown() {
        let docs = vec![GeneratedDoc {
            path: "src/lib.rs".into(),
            markdown: "# Lib".into(),
        }];
        let cursor = write_archive(Cursor::new(Vec::new()), &repo(), &docs, ExportFormat::Markdown)
            .unwrap();

        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        let mut body = String::new();
        archive
            .by_name("demo-docs/src_lib.rs.md")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "# Lib");
    }

    #[test]
    fn test_archive_layout_html() {
        let docs = vec![GeneratedDoc {
            path: "a.py".into(),
            markdown: "## Part".into(),
        }];
        let cursor =
            write_archive(Cursor::new(Vec::new()), &repo(), &docs, ExportFormat::Html).unwrap();

        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        let mut body = String::new();
        archive
            .by_name("demo-docs/a.py.html")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert!(body.contains("<h2>Part</h2>"));
        assert!(body.contains("<title>a.py</title>"));
    }

    #[test]
    fn test_archive_colliding_names_are_made_unique() {
        let docs = vec![
            GeneratedDoc {
                path: "a/b_c.rs".into(),
                markdown: "first".into(),
            },
            GeneratedDoc {
                path: "a_b/c.rs".into(),
                markdown: "second".into(),
            },
        ];
        let cursor = write_archive(Cursor::new(Vec::new()), &repo(), &docs, ExportFormat::Markdown)
            .unwrap();

        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        let mut first = String::new();
        archive
            .by_name("demo-docs/a_b_c.rs.md")
            .unwrap()
            .read_to_string(&mut first)
            .unwrap();
        let mut second = String::new();
        archive
            .by_name("demo-docs/a_b_c.rs (2).md")
            .unwrap()
            .read_to_string(&mut second)
            .unwrap();
        assert_eq!(first, "first");
        assert_eq!(second, "second");
    }

    #[tokio::test]
    async fn test_export_skips_unavailable_and_reports_progress() {
        let transport = ScriptedTransport::new()
            .respond("/repos/octo/demo/contents/a.rs?ref=main", Ok(content("fn a() {}")))
            .respond("/repos/octo/demo/contents/big.bin?ref=main", Ok(json!({ "content": "" })))
            .respond("/repos/octo/demo/git/blobs/s2", Ok(json!({ "encoding": "none" })))
            .respond("/repos/octo/demo/contents/b.rs?ref=main", Ok(content("fn b() {}")));
        let forge = ForgeClient::with_transport(Arc::new(transport));
        let gateway = CannedGateway::replying("# Generated");
        let ctx = DocContext {
            forge: &forge,
            gateway: &gateway,
            repository: &repo(),
            reference: "main",
            model: "test-model",
            max_tokens: 100,
        };

        let mut seen = Vec::new();
        let report = run_export(
            &ctx,
            &[file("a.rs", "s1"), file("big.bin", "s2"), file("b.rs", "s3")],
            |p| seen.push((p.completed, p.total, p.path.clone(), p.skipped)),
        )
        .await;

        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.skipped, vec!["big.bin".to_string()]);
        assert_eq!(report.aborted, None);
        assert_eq!(
            seen,
            vec![
                (1, 3, "a.rs".to_string(), false),
                (2, 3, "big.bin".to_string(), true),
                (3, 3, "b.rs".to_string(), false),
            ]
        );

        // Files are documented in order
        let prompts = gateway.prompts();
        assert!(prompts[0].contains("fn a() {}"));
        assert!(prompts[1].contains("fn b() {}"));
    }

    #[tokio::test]
    async fn test_export_stops_on_rate_limit() {
        let transport = ScriptedTransport::new()
            .respond("/repos/octo/demo/contents/a.rs?ref=main", Err(ForgeError::RateLimitExceeded))
            .respond("/repos/octo/demo/contents/b.rs?ref=main", Ok(content("fn b() {}")));
        let forge = ForgeClient::with_transport(Arc::new(transport));
        let gateway = CannedGateway::replying("# Generated");
        let ctx = DocContext {
            forge: &forge,
            gateway: &gateway,
            repository: &repo(),
            reference: "main",
            model: "test-model",
            max_tokens: 100,
        };

        let report = run_export(&ctx, &[file("a.rs", "s1"), file("b.rs", "s2")], |_| {}).await;
        assert_eq!(report.aborted, Some(ForgeError::RateLimitExceeded));
        assert!(report.documents.is_empty());
        assert!(gateway.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_documents_finished_before_it() {
        let transport = ScriptedTransport::new()
            .respond("/repos/octo/demo/contents/a.rs?ref=main", Ok(content("fn a() {}")))
            .respond("/repos/octo/demo/contents/b.rs?ref=main", Err(ForgeError::RateLimitExceeded))
            .respond("/repos/octo/demo/contents/c.rs?ref=main", Ok(content("fn c() {}")));
        let forge = ForgeClient::with_transport(Arc::new(transport));
        let gateway = CannedGateway::replying("# Generated");
        let ctx = DocContext {
            forge: &forge,
            gateway: &gateway,
            repository: &repo(),
            reference: "main",
            model: "test-model",
            max_tokens: 100,
        };

        let mut seen = Vec::new();
        let report = run_export(
            &ctx,
            &[file("a.rs", "s1"), file("b.rs", "s2"), file("c.rs", "s3")],
            |p| seen.push(p.path.clone()),
        )
        .await;

        assert_eq!(report.aborted, Some(ForgeError::RateLimitExceeded));
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].path, "a.rs");
        assert_eq!(report.documents[0].markdown, "# Generated");
        // Nothing after the rate limit is attempted
        assert_eq!(seen, vec!["a.rs".to_string()]);
        assert_eq!(gateway.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_still_produces_a_document() {
        let transport = ScriptedTransport::new()
            .respond("/repos/octo/demo/contents/a.rs?ref=main", Ok(content("fn a() {}")));
        let forge = ForgeClient::with_transport(Arc::new(transport));
        let gateway = CannedGateway::failing();
        let ctx = DocContext {
            forge: &forge,
            gateway: &gateway,
            repository: &repo(),
            reference: "main",
            model: "test-model",
            max_tokens: 100,
        };

        let report = run_export(&ctx, &[file("a.rs", "s1")], |_| {}).await;
        assert!(report.documents[0].markdown.contains("could not be generated"));
    }
}
