//! Kerning and mark attachment from the GPOS table

use std::collections::BTreeMap;

use write_fonts::{
    read::{
        tables::{
            gdef::Gdef,
            gpos::{AnchorTable, Gpos, PositionSubtables},
            variations::ItemVariationStore,
        },
        ReadError,
    },
    types::{F2Dot14, Tag},
};

use crate::{
    common,
    glyph_names::NameMap,
    source::{Anchor, AttachmentKind, KernPair, MarkAttachment},
    variations::{self, DeltaComputer},
};

mod marks;
mod pairpos;
#[cfg(test)]
mod test_helpers;

/// Pair adjustments from every lookup reachable from the `kern` feature.
///
/// A pair adjusted by more than one lookup gets the sum of the adjustments,
/// which is what a shaper applying all of them would produce.
pub(crate) fn kerning(
    table: &Gpos,
    gdef: Option<&Gdef>,
    names: &NameMap,
    coords: &[F2Dot14],
) -> Result<Vec<KernPair>, ReadError> {
    let ivs = item_var_store(gdef)?;
    let delta_computer = ivs.map(|ivs| DeltaComputer::new(ivs, coords));
    let lookups = lookups_for(table, Tag::new(b"kern"))?;
    let lookup_list = table.lookup_list()?;

    let mut merged = BTreeMap::new();
    for (id, lookup) in lookup_list.lookups().iter().enumerate() {
        if !lookups.contains(&id) {
            continue;
        }
        let PositionSubtables::Pair(subs) = lookup?.subtables()? else {
            continue;
        };
        let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
        for rule in pairpos::get_pairpos_rules(&subs, delta_computer.as_ref())? {
            *merged.entry((rule.first, rule.second)).or_insert(0) += rule.x_advance;
        }
    }

    Ok(merged
        .into_iter()
        .filter_map(|((left, right), value)| {
            Some(KernPair {
                left: names.get(left)?.clone(),
                right: names.get(right)?.clone(),
                value,
            })
        })
        .collect())
}

/// Mark attachments reachable from `mark` (to base) or `mkmk` (to mark).
pub(crate) fn mark_attachments(
    table: &Gpos,
    gdef: Option<&Gdef>,
    names: &NameMap,
    coords: &[F2Dot14],
    kind: AttachmentKind,
) -> Result<Vec<MarkAttachment>, ReadError> {
    let ivs = item_var_store(gdef)?;
    let delta_computer = ivs.map(|ivs| DeltaComputer::new(ivs, coords));
    let feature = match kind {
        AttachmentKind::MarkToBase => Tag::new(b"mark"),
        AttachmentKind::MarkToMark => Tag::new(b"mkmk"),
    };
    let lookups = lookups_for(table, feature)?;
    let lookup_list = table.lookup_list()?;

    let mut result = Vec::new();
    for (id, lookup) in lookup_list.lookups().iter().enumerate() {
        if !lookups.contains(&id) {
            continue;
        }
        let rules = match (lookup?.subtables()?, kind) {
            (PositionSubtables::MarkToBase(subs), AttachmentKind::MarkToBase) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                marks::get_mark_base_rules(&subs, delta_computer.as_ref())?
            }
            (PositionSubtables::MarkToMark(subs), AttachmentKind::MarkToMark) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                marks::get_mark_mark_rules(&subs, delta_computer.as_ref())?
            }
            _ => continue,
        };
        result.extend(rules.into_iter().filter_map(|rule| {
            Some(MarkAttachment {
                base: names.get(rule.base)?.clone(),
                base_anchor: rule.base_anchor,
                marks: rule
                    .marks
                    .into_iter()
                    .filter_map(|(gid, anchor)| Some((names.get(gid)?.clone(), anchor)))
                    .collect(),
            })
        }));
    }
    Ok(result)
}

fn item_var_store<'a>(
    gdef: Option<&Gdef<'a>>,
) -> Result<Option<ItemVariationStore<'a>>, ReadError> {
    gdef.and_then(|gdef| gdef.item_var_store()).transpose()
}

fn lookups_for(table: &Gpos, feature: Tag) -> Result<Vec<usize>, ReadError> {
    let script_list = table.script_list()?;
    let feature_list = table.feature_list()?;
    let by_lookup = common::features_by_lookup(&script_list, &feature_list)?;
    Ok(common::lookups_for_feature(&by_lookup, feature)
        .into_iter()
        .map(usize::from)
        .collect())
}

fn resolve_anchor(
    anchor: &AnchorTable,
    computer: Option<&DeltaComputer>,
) -> Result<Anchor, ReadError> {
    match anchor {
        AnchorTable::Format3(table) => Ok(Anchor {
            x: variations::resolve_value(Some(table.x_coordinate()), table.x_device(), computer)?,
            y: variations::resolve_value(Some(table.y_coordinate()), table.y_device(), computer)?,
        }),
        _ => Ok(Anchor {
            x: anchor.x_coordinate() as i32,
            y: anchor.y_coordinate() as i32,
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use write_fonts::{
        read::{FontData, FontRead},
        tables::gpos::builders::{MarkToBaseBuilder, MarkToMarkBuilder, PairPosBuilder},
    };

    use super::test_helpers::{SimpleMarkBuilder, SimplePairPosBuilder};
    use super::*;
    use crate::test_fonts::{self, lookup};

    const GLYPHS: &[&str] = &[".notdef", "A", "V", "T", "acute", "grave"];

    fn gpos_bytes() -> Vec<u8> {
        let mut kern1 = PairPosBuilder::default();
        kern1.add_pair(1, 2, -50);
        let mut kern2 = PairPosBuilder::default();
        kern2.add_pair(1, 2, -10);
        kern2.add_pair(2, 3, 20);
        let mut dist = PairPosBuilder::default();
        dist.add_pair(1, 3, -999);

        let mut mark = MarkToBaseBuilder::default();
        mark.add_mark(4, "top", (0, 500));
        mark.add_base(1, "top", (300, 700));
        let mut mkmk = MarkToMarkBuilder::default();
        mkmk.add_mark(5, "top", (0, 0));
        mkmk.add_base(4, "top", (0, 650));

        test_fonts::gpos_bytes(
            &[
                (b"dist", &[2]),
                (b"kern", &[0, 1]),
                (b"mark", &[3]),
                (b"mkmk", &[4]),
            ],
            vec![
                lookup(kern1.build_subtables()),
                lookup(kern2.build_subtables()),
                lookup(dist.build_subtables()),
                lookup(vec![mark.build_exactly_one_subtable()]),
                lookup(vec![mkmk.build_exactly_one_subtable()]),
            ],
        )
    }

    #[test]
    fn kern_lookups_are_summed() {
        let bytes = gpos_bytes();
        let gpos = Gpos::read(FontData::new(&bytes)).unwrap();
        let kerns = kerning(&gpos, None, &test_fonts::names(GLYPHS), &[]).unwrap();
        let kerns = kerns
            .iter()
            .map(|k| (k.left.as_str(), k.right.as_str(), k.value))
            .collect::<Vec<_>>();
        assert_eq!(kerns, [("A", "V", -60), ("V", "T", 20)]);
    }

    #[test]
    fn marks_and_mkmks_come_from_their_own_feature() {
        let bytes = gpos_bytes();
        let gpos = Gpos::read(FontData::new(&bytes)).unwrap();
        let names = test_fonts::names(GLYPHS);

        let marks =
            mark_attachments(&gpos, None, &names, &[], AttachmentKind::MarkToBase).unwrap();
        assert_eq!(
            marks,
            [MarkAttachment {
                base: "A".into(),
                base_anchor: Anchor { x: 300, y: 700 },
                marks: vec![("acute".into(), Anchor { x: 0, y: 500 })],
            }]
        );

        let mkmks =
            mark_attachments(&gpos, None, &names, &[], AttachmentKind::MarkToMark).unwrap();
        assert_eq!(
            mkmks,
            [MarkAttachment {
                base: "acute".into(),
                base_anchor: Anchor { x: 0, y: 650 },
                marks: vec![("grave".into(), Anchor::default())],
            }]
        );
    }
}
