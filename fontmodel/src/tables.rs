//! Comparable records derived from one font snapshot

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    glyph_input::GlyphInput,
    resolver::InputResolver,
    source::{
        Anchor, Attribute, AttachmentKind, FontSource, MarkAttachment, NameRecord, RawGlyphMetrics,
    },
    types::{GlyphName, SnapshotId},
};

/// A glyph's input and the area its outline encloses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlyphRecord {
    pub glyph: GlyphInput,
    pub area: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernRecord {
    pub left: GlyphInput,
    pub right: GlyphInput,
    pub value: i32,
}

/// A base (or mark) glyph, one of its anchors, and the first mark that
/// attaches there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkRecord {
    pub base: GlyphInput,
    pub base_anchor: Anchor,
    pub mark: GlyphInput,
    pub mark_anchor: Anchor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricsRecord {
    pub glyph: GlyphInput,
    pub advance: i32,
    /// `x_min`, zero for empty glyphs.
    pub lsb: i32,
    /// Advance minus `x_max`, zero for empty glyphs.
    pub rsb: i32,
}

/// Every table derived from one snapshot.
///
/// Built in one go by [`DerivedTables::build`] and replaced as a whole.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DerivedTables {
    #[serde(skip)]
    pub snapshot: SnapshotId,
    pub glyphset: IndexMap<GlyphName, GlyphInput>,
    pub glyphs: Vec<GlyphRecord>,
    pub names: Vec<NameRecord>,
    pub kerns: Vec<KernRecord>,
    pub marks: Vec<MarkRecord>,
    pub mkmks: Vec<MarkRecord>,
    pub metrics: Vec<MetricsRecord>,
    pub attribs: Vec<Attribute>,
}

impl DerivedTables {
    pub(crate) fn build(
        font: &impl FontSource,
        raw_metrics: &[RawGlyphMetrics],
        resolver: &mut InputResolver,
    ) -> Self {
        let snapshot = resolver.snapshot();
        let glyphset: IndexMap<_, _> = resolver
            .all_inputs()
            .into_iter()
            .map(|input| (input.name.clone(), input))
            .collect();

        let glyphs = raw_metrics
            .iter()
            .filter_map(|raw| {
                Some(GlyphRecord {
                    glyph: glyphset.get(&raw.name)?.clone(),
                    area: raw.area,
                })
            })
            .collect();
        let metrics = raw_metrics
            .iter()
            .filter_map(|raw| {
                let (lsb, rsb) = raw
                    .x_extents
                    .map(|(x_min, x_max)| (x_min, raw.advance - x_max))
                    .unwrap_or_default();
                Some(MetricsRecord {
                    glyph: glyphset.get(&raw.name)?.clone(),
                    advance: raw.advance,
                    lsb,
                    rsb,
                })
            })
            .collect();

        let mut names = font.name_records();
        names.sort();

        let kerns = font
            .kerning()
            .into_iter()
            .filter_map(|pair| {
                Some(KernRecord {
                    left: glyphset.get(&pair.left)?.clone(),
                    right: glyphset.get(&pair.right)?.clone(),
                    value: pair.value,
                })
            })
            .collect();

        let marks = mark_records(font.mark_attachments(AttachmentKind::MarkToBase), &glyphset);
        let mkmks = mark_records(font.mark_attachments(AttachmentKind::MarkToMark), &glyphset);

        let tables = DerivedTables {
            snapshot,
            glyphs,
            names,
            kerns,
            marks,
            mkmks,
            metrics,
            attribs: font.attributes(),
            glyphset,
        };
        log::debug!(
            "derived tables for {snapshot:?}: {} glyphs, {} names, {} kerns, {} marks, {} mkmks",
            tables.glyphset.len(),
            tables.names.len(),
            tables.kerns.len(),
            tables.marks.len(),
            tables.mkmks.len(),
        );
        tables
    }
}

fn mark_records(
    attachments: Vec<MarkAttachment>,
    glyphset: &IndexMap<GlyphName, GlyphInput>,
) -> Vec<MarkRecord> {
    attachments
        .into_iter()
        .filter_map(|attachment| {
            let (mark, mark_anchor) = attachment.marks.into_iter().next()?;
            Some(MarkRecord {
                base: glyphset.get(&attachment.base)?.clone(),
                base_anchor: attachment.base_anchor,
                mark: glyphset.get(&mark)?.clone(),
                mark_anchor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_helpers::MockFont;

    fn build(font: &MockFont) -> DerivedTables {
        let metrics = font.glyph_metrics();
        let mut resolver = InputResolver::with_metrics(font, &metrics, SnapshotId::default());
        DerivedTables::build(font, &metrics, &mut resolver)
    }

    #[test]
    fn side_bearings() {
        let font = MockFont::new()
            .glyph("o", 'o', 500)
            .extents("o", 40, 470)
            .glyph("space", ' ', 250)
            .extents("space", 0, 0);
        let tables = build(&font);
        let o = &tables.metrics[0];
        assert_eq!((o.advance, o.lsb, o.rsb), (500, 40, 30));

        let font = MockFont::new().glyph_without_char("empty", 300);
        let tables = build(&font);
        let empty = &tables.metrics[0];
        assert_eq!((empty.advance, empty.lsb, empty.rsb), (300, 0, 0));
    }

    #[test]
    fn kerns_outside_the_glyphset_are_dropped() {
        let font = MockFont::new()
            .glyph("A", 'A', 600)
            .glyph("V", 'V', 600)
            .kern("A", "V", -80)
            .kern("A", "ghost", -20);
        let tables = build(&font);
        assert_eq!(tables.kerns.len(), 1);
        let kern = &tables.kerns[0];
        assert_eq!(
            (kern.left.key(), kern.right.key()),
            ("A".to_string(), "V".to_string())
        );
        assert_eq!(kern.value, -80);
    }

    #[test]
    fn first_mark_of_each_class() {
        let font = MockFont::new()
            .glyph("a", 'a', 500)
            .glyph("gravecomb", '\u{300}', 0)
            .glyph("acutecomb", '\u{301}', 0)
            .mark(
                AttachmentKind::MarkToBase,
                "a",
                (250, 500),
                &[("gravecomb", (100, 450)), ("acutecomb", (120, 450))],
            )
            .mark(
                AttachmentKind::MarkToMark,
                "acutecomb",
                (120, 700),
                &[("gravecomb", (100, 450))],
            );
        let tables = build(&font);
        assert_eq!(tables.marks.len(), 1);
        assert_eq!(tables.marks[0].mark.name.as_str(), "gravecomb");
        assert_eq!(tables.marks[0].base_anchor, Anchor { x: 250, y: 500 });
        assert_eq!(tables.mkmks.len(), 1);
        assert_eq!(tables.mkmks[0].base.name.as_str(), "acutecomb");
    }

    #[test]
    fn glyphset_follows_glyph_order() {
        let font = MockFont::new()
            .glyph_without_char(".notdef", 500)
            .glyph("b", 'b', 500)
            .glyph("a", 'a', 500)
            .area("a", 1234.5);
        let tables = build(&font);
        let order: Vec<_> = tables.glyphset.keys().map(GlyphName::as_str).collect();
        assert_eq!(order, [".notdef", "b", "a"]);
        assert_eq!(tables.glyphs[2].area, 1234.5);
    }
}
