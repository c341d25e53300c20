//! Word document (DOCX) export.
//!
//! Blocks separated by a blank line become paragraphs; single newlines
//! inside a block become line breaks.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run};

use crate::export::sanitize::to_xml_chars;
use crate::export::{ExportError, ExportFormat, Exporter};

/// DOCX exporter.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocxExporter;

impl Exporter for DocxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, transcript: &str) -> Result<Vec<u8>, ExportError> {
        let mut out = Cursor::new(Vec::new());
        build_document(transcript)
            .build()
            .pack(&mut out)
            .map_err(|e| ExportError::Docx(e.to_string()))?;
        Ok(out.into_inner())
    }
}

fn build_document(transcript: &str) -> Docx {
    let clean = to_xml_chars(transcript);
    let normalized = clean.replace("\r\n", "\n");

    normalized
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .fold(Docx::new(), |doc, block| doc.add_paragraph(paragraph(block)))
}

fn paragraph(block: &str) -> Paragraph {
    let run = block
        .split('\n')
        .enumerate()
        .fold(Run::new(), |run, (idx, line)| {
            let run = if idx > 0 {
                run.add_break(BreakType::TextWrapping)
            } else {
                run
            };
            run.add_text(line)
        });
    Paragraph::new().add_run(run)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    fn read_part(bytes: &[u8], name: &str) -> Result<String, Box<dyn std::error::Error>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut file = archive.by_name(name)?;
        let mut out = String::new();
        file.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_package_contains_required_parts() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = DocxExporter.render("You: hi\n\n")?;
        assert!(bytes.starts_with(b"PK"));
        assert!(read_part(&bytes, "[Content_Types].xml")?.contains("wordprocessingml"));
        assert!(read_part(&bytes, "word/document.xml")?.contains("You: hi"));
        Ok(())
    }

    #[test]
    fn test_blocks_become_escaped_paragraphs() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = DocxExporter
            .render("You: <b>Tom & Jerry</b>\n\nAssistant: line one\nline two\n\n")?;
        let document = read_part(&bytes, "word/document.xml")?;
        assert_eq!(document.matches("</w:p>").count(), 2);
        assert!(document.contains("Tom &amp; Jerry"));
        assert!(!document.contains("<b>"));
        assert!(document.contains("line one"));
        assert!(document.contains("<w:br"));
        assert!(document.contains("line two"));
        Ok(())
    }

    #[test]
    fn test_forbidden_xml_chars_are_removed() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = DocxExporter.render("You: bell\u{7} and nul\u{0} 🙏\n\n")?;
        let document = read_part(&bytes, "word/document.xml")?;
        assert!(!document.contains('\u{7}'));
        assert!(!document.contains('\u{0}'));
        assert!(document.contains("🙏"));
        Ok(())
    }

    #[test]
    fn test_empty_transcript_still_packs() -> Result<(), ExportError> {
        let bytes = DocxExporter.render("")?;
        assert!(bytes.starts_with(b"PK"));
        Ok(())
    }
}
