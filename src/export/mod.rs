//! Transcript export to downloadable documents.
//!
//! Every exporter sanitizes its input for the target encoding before
//! rendering, so unsupported characters are dropped or substituted rather
//! than failing the export. Export never touches session state.

pub mod docx;
pub mod pdf;
pub mod sanitize;
pub mod text;

pub use docx::DocxExporter;
pub use pdf::PdfExporter;
pub use text::TextExporter;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while rendering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// DOCX package could not be written.
    #[error("docx error: {0}")]
    Docx(String),
    /// PDF rendering failed.
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// Supported export targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// UTF-8 plain text.
    Text,
    /// Word-processor document.
    Docx,
    /// Paginated PDF.
    Pdf,
}

impl ExportFormat {
    /// All formats, in menu order.
    pub const ALL: [Self; 3] = [Self::Text, Self::Docx, Self::Pdf];

    /// MIME type of the rendered document.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Suggested download file name.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("conversation.{}", self.extension())
    }

    /// Exporter for this format.
    #[must_use]
    pub fn exporter(self) -> Box<dyn Exporter> {
        match self {
            Self::Text => Box::new(TextExporter),
            Self::Docx => Box::new(DocxExporter),
            Self::Pdf => Box::new(PdfExporter::default()),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "docx" | "word" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unsupported export format {other}")),
        }
    }
}

/// Renders a transcript blob into a document.
pub trait Exporter: Send + Sync {
    /// Target format.
    fn format(&self) -> ExportFormat;

    /// Render `transcript` into document bytes.
    ///
    /// # Errors
    /// Returns an error if the underlying document library fails.
    fn render(&self, transcript: &str) -> Result<Vec<u8>, ExportError>;
}

/// A rendered document ready for download.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportedDocument {
    /// Format the bytes are in.
    pub format: ExportFormat,
    /// Document bytes.
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    /// MIME type.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Suggested file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.format.file_name()
    }
}

/// Render `transcript` in `format`.
///
/// # Errors
/// Returns an error if rendering fails.
pub fn export_transcript(
    format: ExportFormat,
    transcript: &str,
) -> Result<ExportedDocument, ExportError> {
    let bytes = format.exporter().render(transcript)?;
    tracing::debug!(%format, bytes = bytes.len(), "transcript exported");
    Ok(ExportedDocument { format, bytes })
}
