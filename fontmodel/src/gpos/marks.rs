use std::collections::HashSet;

use write_fonts::read::{
    tables::gpos::{AnchorTable, MarkArray, MarkBasePosFormat1, MarkMarkPosFormat1},
    types::GlyphId16,
    ReadError,
};

use crate::{source::Anchor, variations::DeltaComputer};

use super::resolve_anchor;

/// A base (or attaching mark) anchor for one mark class, with the marks of that class
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct AttachmentRule {
    pub base: GlyphId16,
    pub base_anchor: Anchor,
    pub marks: Vec<(GlyphId16, Anchor)>,
}

pub(super) fn get_mark_base_rules(
    subtables: &[MarkBasePosFormat1],
    delta_computer: Option<&DeltaComputer>,
) -> Result<Vec<AttachmentRule>, ReadError> {
    // so we only take the first coverage hit in each subtable, which means
    // we just need track what we've seen.
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for sub in subtables.iter() {
        let base_array = sub.base_array()?;
        let base_records = base_array.base_records();
        let marks = MarkClasses::new(sub.mark_coverage()?.iter().collect(), sub.mark_array()?);
        for (base_ix, base_glyph) in sub.base_coverage()?.iter().enumerate() {
            let base_record = base_records.get(base_ix)?;
            let anchors = base_record
                .base_anchors(base_array.offset_data())
                .iter()
                .map(Option::transpose)
                .collect::<Result<Vec<_>, _>>()?;
            marks.append_rules(base_glyph, &anchors, delta_computer, &mut seen, &mut result)?;
        }
    }
    Ok(result)
}

pub(super) fn get_mark_mark_rules(
    subtables: &[MarkMarkPosFormat1],
    delta_computer: Option<&DeltaComputer>,
) -> Result<Vec<AttachmentRule>, ReadError> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for sub in subtables.iter() {
        let base_array = sub.mark2_array()?;
        let base_records = base_array.mark2_records();
        let marks = MarkClasses::new(sub.mark1_coverage()?.iter().collect(), sub.mark1_array()?);
        for (base_ix, base_glyph) in sub.mark2_coverage()?.iter().enumerate() {
            let base_record = base_records.get(base_ix)?;
            let anchors = base_record
                .mark2_anchors(base_array.offset_data())
                .iter()
                .map(Option::transpose)
                .collect::<Result<Vec<_>, _>>()?;
            marks.append_rules(base_glyph, &anchors, delta_computer, &mut seen, &mut result)?;
        }
    }
    Ok(result)
}

/// The attaching side of one subtable: mark glyphs with their class and anchor
struct MarkClasses<'a> {
    glyphs: Vec<GlyphId16>,
    array: MarkArray<'a>,
}

impl<'a> MarkClasses<'a> {
    fn new(glyphs: Vec<GlyphId16>, array: MarkArray<'a>) -> Self {
        MarkClasses { glyphs, array }
    }

    // one rule per (base, class) that has a base anchor
    fn append_rules(
        &self,
        base_glyph: GlyphId16,
        base_anchors: &[Option<AnchorTable>],
        delta_computer: Option<&DeltaComputer>,
        seen: &mut HashSet<(GlyphId16, GlyphId16)>,
        result: &mut Vec<AttachmentRule>,
    ) -> Result<(), ReadError> {
        let mark_records = self.array.mark_records();
        for (class, base_anchor) in base_anchors.iter().enumerate() {
            let Some(base_anchor) = base_anchor else {
                continue;
            };
            let base_anchor = resolve_anchor(base_anchor, delta_computer)?;
            let mut marks = Vec::new();
            for (mark_ix, mark_record) in mark_records.iter().enumerate() {
                if mark_record.mark_class() as usize != class {
                    continue;
                }
                let Some(mark_glyph) = self.glyphs.get(mark_ix).copied() else {
                    continue;
                };
                if !seen.insert((base_glyph, mark_glyph)) {
                    // this was included in a previous subtable, so skip it
                    continue;
                }
                let mark_anchor = mark_record.mark_anchor(self.array.offset_data())?;
                marks.push((mark_glyph, resolve_anchor(&mark_anchor, delta_computer)?));
            }
            if marks.is_empty() {
                continue;
            }
            result.push(AttachmentRule {
                base: base_glyph,
                base_anchor,
                marks,
            });
        }
        Ok(())
    }
}
