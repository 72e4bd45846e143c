// Input, rendering and export plumbing shared by `summarize` and `rewrite`.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::app::Runtime;
use crate::errors::CliError;
use crate::export::{self, ExportKind};
use crate::format::{self, Document};
use crate::parse::response::format_usage_line;
use crate::spinner;
use crate::views::document::{DocumentTool, DocumentView};

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Text to work on
    pub text: Option<String>,
    /// Read the text from stdin
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub stdin: bool,
    /// Read the text from a file
    #[arg(long, value_name = "PATH", conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    /// Styled for the terminal
    #[default]
    Terminal,
    /// HTML fragment
    Html,
    /// Markup stripped
    Plain,
    /// The model's text untouched
    Raw,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = RenderFormat::Terminal)]
    pub format: RenderFormat,
    /// Also write the answer to a file; repeat for several formats
    #[arg(long = "export", value_enum)]
    pub exports: Vec<ExportKind>,
    /// Where exported files go
    #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
    /// Open exported files with the system viewer
    #[arg(long)]
    pub open: bool,
}

pub fn resolve_input<R: Read>(args: &InputArgs, mut stdin: R) -> Result<String, CliError> {
    if args.stdin {
        let mut input = String::new();
        stdin
            .read_to_string(&mut input)
            .map_err(|e| CliError::Generic(format!("Failed reading stdin: {e}")))?;
        return Ok(input);
    }

    if let Some(path) = &args.file {
        return fs::read_to_string(path).map_err(|e| {
            CliError::Usage(format!("Failed reading {}: {e}", path.display()))
        });
    }

    Ok(args.text.clone().unwrap_or_default())
}

pub fn render(doc: &Document, raw: &str, format: RenderFormat, interactive: bool) -> String {
    match format {
        RenderFormat::Terminal if interactive => format::to_terminal(doc),
        RenderFormat::Terminal | RenderFormat::Plain => format::to_plain(doc),
        RenderFormat::Html => format::to_html(doc),
        RenderFormat::Raw => raw.to_string(),
    }
}

pub async fn run(
    runtime: &Runtime,
    tool: DocumentTool,
    input: String,
    output: &OutputArgs,
) -> Result<(), CliError> {
    let mut view = DocumentView::new(tool, input);
    let messages = view.begin()?;
    let api = runtime.api_client()?;

    let spinner = spinner::start(&runtime.output, tool.progress_label());
    let result = api.complete(&messages).await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    let (usage_line, model, usage) = result
        .as_ref()
        .map(|c| (format_usage_line(c), c.model.clone(), c.usage.clone()))
        .unwrap_or_default();
    let content = match view.finish(result) {
        Ok(content) => content.to_string(),
        Err(err) => {
            runtime.output.print_stderr(tool.failure_notice());
            return Err(err);
        }
    };
    let doc = view.document().unwrap_or_default();

    // The answer goes out before any file is written.
    if !runtime.output.json {
        let interactive = runtime.output.is_interactive();
        runtime
            .output
            .print_human(&render(&doc, &content, output.format, interactive));
    }
    let report = export_all(&doc, tool, &output.exports, &output.out_dir);

    if runtime.output.json {
        let written: Vec<&PathBuf> = report.written.iter().map(|(_, path)| path).collect();
        runtime.output.print_json(&json!({
            "ok": report.failed.is_empty(),
            "content": content,
            "plain": format::to_plain(&doc),
            "model": model,
            "usage": usage,
            "exports": written,
            "exportErrors": report.failed,
        }))?;
    } else {
        for (kind, path) in &report.written {
            runtime
                .output
                .print_stderr(&format!("{} saved: {}", kind.label(), path.display()));
        }
    }
    runtime.output.print_verbose(&usage_line);

    if output.open {
        for (_, path) in &report.written {
            open::that(path).map_err(|e| {
                CliError::Generic(format!("Failed to open {}: {e}", path.display()))
            })?;
        }
    }

    if runtime.output.json || report.failed.is_empty() {
        return Ok(());
    }
    let details = report
        .failed
        .iter()
        .map(|f| format!("{}: {}", f.format, f.error))
        .collect::<Vec<_>>()
        .join("; ");
    Err(CliError::Generic(format!(
        "There was an error generating your document ({details})"
    )))
}

#[derive(Debug, Serialize)]
struct ExportFailure {
    format: &'static str,
    error: String,
}

#[derive(Debug, Default)]
struct ExportReport {
    written: Vec<(ExportKind, PathBuf)>,
    failed: Vec<ExportFailure>,
}

/// Tries every requested kind; one failure does not stop the others.
fn export_all(
    doc: &Document,
    tool: DocumentTool,
    kinds: &[ExportKind],
    out_dir: &Path,
) -> ExportReport {
    let meta = tool.export_meta();
    let mut report = ExportReport::default();
    for kind in kinds {
        match export::export_document(doc, *kind, &meta, out_dir) {
            Ok(path) => report.written.push((*kind, path)),
            Err(err) => {
                warn!(kind = kind.extension(), error = %err, "export failed");
                report.failed.push(ExportFailure {
                    format: kind.extension(),
                    error: err.to_string(),
                });
            }
        }
    }
    if !report.written.is_empty() {
        info!(count = report.written.len(), "exports written");
    }
    report
}
