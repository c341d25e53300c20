//! Paginated PDF export using a built-in Helvetica font.
//!
//! Built-in PDF fonts only cover Latin-1, so the transcript is always passed
//! through [`to_latin1`] first.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::export::sanitize::to_latin1;
use crate::export::{ExportError, ExportFormat, Exporter};

/// A4 page width.
const PAGE_WIDTH: Mm = Mm(210.0);
/// A4 page height.
const PAGE_HEIGHT: Mm = Mm(297.0);
const LAYER_NAME: &str = "Layer 1";

/// Page layout for PDF export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PdfExporter {
    /// Margin on every side, in millimetres.
    pub margin_mm: f32,
    /// Font size, in points.
    pub font_size: f32,
    /// Baseline-to-baseline distance, in millimetres.
    pub line_height_mm: f32,
    /// Characters per line before wrapping.
    pub wrap_columns: usize,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self {
            margin_mm: 15.0,
            font_size: 12.0,
            line_height_mm: 6.0,
            wrap_columns: 90,
        }
    }
}

impl PdfExporter {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lines_per_page(&self) -> usize {
        let usable = 2.0f32.mul_add(-self.margin_mm, PAGE_HEIGHT.0);
        ((usable / self.line_height_mm).floor() as usize).max(1)
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, transcript: &str) -> Result<Vec<u8>, ExportError> {
        let clean = to_latin1(transcript);
        let lines = wrap_lines(&clean, self.wrap_columns);

        let (doc, page, layer) =
            PdfDocument::new("Conversation", PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        let per_page = self.lines_per_page();
        let mut current = doc.get_page(page).get_layer(layer);
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 && idx % per_page == 0 {
                let (next_page, next_layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
                current = doc.get_page(next_page).get_layer(next_layer);
            }
            self.write_line(&current, &font, line, idx % per_page);
        }

        doc.save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }
}

impl PdfExporter {
    #[allow(clippy::cast_precision_loss)]
    fn write_line(&self, layer: &PdfLayerReference, font: &IndirectFontRef, line: &str, row: usize) {
        if line.is_empty() {
            return;
        }
        let top = PAGE_HEIGHT.0 - self.margin_mm - self.line_height_mm;
        let y = (row as f32).mul_add(-self.line_height_mm, top);
        layer.use_text(line, self.font_size, Mm(self.margin_mm), Mm(y), font);
    }
}

/// Split on newlines and word-wrap each line to `columns` characters.
/// Words longer than a line are hard-split.
fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut out = Vec::new();

    for raw in text.lines() {
        if raw.trim().is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if current_len > 0 {
                    out.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(columns);
                out.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > columns {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        if current_len > 0 {
            out.push(current);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_pdf_header() -> Result<(), ExportError> {
        let bytes = PdfExporter::default().render("You: hello\n\nAssistant: peace\n\n")?;
        assert!(bytes.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn test_non_latin1_does_not_fail() -> Result<(), ExportError> {
        let bytes = PdfExporter::default().render("You: 🙏 平安 “grace”\n\n")?;
        assert!(bytes.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn test_long_transcript_paginates() -> Result<(), ExportError> {
        let exporter = PdfExporter::default();
        let transcript = "You: line\n".repeat(exporter.lines_per_page() * 3);
        let bytes = exporter.render(&transcript)?;
        assert!(bytes.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn test_lines_per_page() {
        let exporter = PdfExporter::default();
        // (297 - 30) / 6 = 44.5
        assert_eq!(exporter.lines_per_page(), 44);
    }

    #[test]
    fn test_wrap_lines_on_word_boundaries() {
        let lines = wrap_lines("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_wrap_lines_keeps_blank_lines_and_splits_long_words() {
        let lines = wrap_lines("abcdefghij\n\nok", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "", "ok"]);
    }
}
