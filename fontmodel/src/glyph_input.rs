//! The shaping input resolved for one glyph

use icu_properties::{props::CanonicalCombiningClass, CodePointMapData};
use serde::Serialize;
use write_fonts::types::Tag;

use crate::types::{GlyphName, SnapshotId};

/// Text plus active features that a shaper turns into one glyph.
///
/// A glyph no input can reach has empty `text` and no `features`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlyphInput {
    pub name: GlyphName,
    /// Sorted, without duplicates.
    pub features: Vec<Tag>,
    pub text: String,
    /// The first character of the glyph's own text (ignoring padding) has a
    /// non-zero canonical combining class.
    pub combining: bool,
    #[serde(skip)]
    snapshot: SnapshotId,
}

impl GlyphInput {
    pub(crate) fn resolved(
        name: GlyphName,
        features: Vec<Tag>,
        text: String,
        padding: usize,
        snapshot: SnapshotId,
    ) -> Self {
        let combining = text.chars().next().is_some_and(is_combining);
        let text = if padding > 0 {
            " ".repeat(padding) + &text
        } else {
            text
        };
        GlyphInput {
            name,
            features,
            text,
            combining,
            snapshot,
        }
    }

    pub(crate) fn unresolved(name: GlyphName, snapshot: SnapshotId) -> Self {
        GlyphInput {
            name,
            features: Vec::new(),
            text: String::new(),
            combining: false,
            snapshot,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.text.is_empty()
    }

    /// Identifies the glyph across fonts: text followed by feature tags.
    pub fn key(&self) -> String {
        let mut key = self.text.clone();
        for tag in &self.features {
            key.push_str(&tag.to_string());
        }
        key
    }

    /// The font snapshot this input was resolved against.
    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }
}

fn is_combining(c: char) -> bool {
    CodePointMapData::<CanonicalCombiningClass>::new().get(c) != CanonicalCombiningClass::NotReordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combining_ignores_padding() {
        let acute = GlyphInput::resolved(
            "acutecomb".into(),
            Vec::new(),
            "\u{301}".into(),
            2,
            SnapshotId::default(),
        );
        assert_eq!(acute.text, "  \u{301}");
        assert!(acute.combining);

        let a = GlyphInput::resolved("A".into(), Vec::new(), "A".into(), 0, SnapshotId::default());
        assert!(!a.combining);
    }

    #[test]
    fn key_is_text_then_features() {
        let input = GlyphInput::resolved(
            "f_i.sc".into(),
            vec![Tag::new(b"liga"), Tag::new(b"smcp")],
            "fi".into(),
            0,
            SnapshotId::default(),
        );
        assert_eq!(input.key(), "filigasmcp");
    }

    #[test]
    fn unresolved_is_empty() {
        let input = GlyphInput::unresolved("orphan".into(), SnapshotId::default());
        assert!(!input.is_resolved());
        assert_eq!(input.key(), "");
        assert!(!input.combining);
    }
}
