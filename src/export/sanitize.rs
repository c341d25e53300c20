//! Character sanitization applied before handing text to an exporter.
//!
//! Each function returns the input borrowed when nothing had to change.

use std::borrow::Cow;

/// Replacement for typographic characters outside Latin-1.
fn latin1_substitute(c: char) -> Option<&'static str> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some("'"),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some("\""),
        '\u{2013}' | '\u{2014}' | '\u{2212}' => Some("-"),
        '\u{2026}' => Some("..."),
        '\u{2022}' => Some("*"),
        '\u{2009}' | '\u{202F}' => Some(" "),
        _ => None,
    }
}

fn is_printable_latin1(c: char) -> bool {
    (c as u32) < 0x100 && !c.is_control()
}

/// Reduce `text` to printable Latin-1 plus newlines.
///
/// Common typographic punctuation is substituted with ASCII, tabs become a
/// space, everything else outside Latin-1 (emoji, CJK, ...) is dropped.
#[must_use]
pub fn to_latin1(text: &str) -> Cow<'_, str> {
    if text.chars().all(|c| c == '\n' || is_printable_latin1(c)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\n' || is_printable_latin1(c) {
            out.push(c);
        } else if c == '\t' {
            out.push(' ');
        } else if let Some(sub) = latin1_substitute(c) {
            out.push_str(sub);
        }
    }
    Cow::Owned(out)
}

/// Whether `c` may appear in an XML 1.0 document.
const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drop characters XML 1.0 forbids (most C0 controls, U+FFFE, U+FFFF).
#[must_use]
pub fn to_xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_borrows_clean_text() {
        let text = "Café and crème\nbrûlée";
        assert!(matches!(to_latin1(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_latin1_drops_emoji_and_substitutes_quotes() {
        let text = "💬 At the heart \u{2014} \u{201C}grace\u{201D} isn\u{2019}t earned\u{2026} 你好";
        assert_eq!(
            to_latin1(text),
            " At the heart - \"grace\" isn't earned... "
        );
    }

    #[test]
    fn test_latin1_strips_controls_keeps_newlines() {
        assert_eq!(to_latin1("a\tb\u{7}c\nd\u{85}"), "a bc\nd");
    }

    #[test]
    fn test_xml_chars() {
        assert!(matches!(to_xml_chars("plain ✝ text"), Cow::Borrowed(_)));
        assert_eq!(to_xml_chars("bad\u{0}\u{1B}char\u{FFFE}"), "badchar");
    }
}
