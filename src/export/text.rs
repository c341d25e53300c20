//! Plain text export.

use crate::export::{ExportError, ExportFormat, Exporter};

/// UTF-8 text; every character is representable, so nothing is stripped.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextExporter;

impl Exporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn render(&self, transcript: &str) -> Result<Vec<u8>, ExportError> {
        Ok(transcript.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_verbatim_utf8() -> Result<(), ExportError> {
        let transcript = "You: ¿Dónde está Dios? 🙏\n\n";
        let bytes = TextExporter.render(transcript)?;
        assert_eq!(String::from_utf8(bytes).ok().as_deref(), Some(transcript));
        Ok(())
    }
}
