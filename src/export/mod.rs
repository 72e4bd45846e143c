//! Writes an answer to `.txt`, `.docx` or `.pdf`.

mod docx;
mod pdf;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::info;

use crate::errors::CliError;
use crate::format::{self, Document};

pub use docx::build_docx;
pub use pdf::{PdfInfo, build_pdf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Txt,
    Docx,
    Pdf,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Txt => "txt",
            ExportKind::Docx => "docx",
            ExportKind::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Txt => "Text file",
            ExportKind::Docx => "Word document",
            ExportKind::Pdf => "PDF document",
        }
    }
}

/// What a document is called on disk and inside PDF metadata.
#[derive(Debug, Clone, Copy)]
pub struct ExportMeta {
    pub stem: &'static str,
    pub title: &'static str,
    pub subject: &'static str,
}

/// `summary-2025-01-31T09-15-00-123Z.txt`
pub fn file_name(stem: &str, kind: ExportKind, at: DateTime<Utc>) -> String {
    let timestamp = at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    format!("{stem}-{timestamp}.{}", kind.extension())
}

pub fn render_bytes(doc: &Document, kind: ExportKind, meta: &ExportMeta) -> Result<Vec<u8>, CliError> {
    match kind {
        ExportKind::Txt => Ok(format::to_plain(doc).into_bytes()),
        ExportKind::Docx => build_docx(&format::export_blocks(doc)),
        ExportKind::Pdf => Ok(build_pdf(
            &format::export_blocks(doc),
            &PdfInfo {
                title: meta.title,
                subject: meta.subject,
            },
        )),
    }
}

pub fn export_document(
    doc: &Document,
    kind: ExportKind,
    meta: &ExportMeta,
    out_dir: &Path,
) -> Result<PathBuf, CliError> {
    let bytes = render_bytes(doc, kind, meta)?;
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name(meta.stem, kind, Utc::now()));
    fs::write(&path, bytes)?;
    info!(path = %path.display(), kind = kind.extension(), "exported document");
    Ok(path)
}
