use std::collections::{HashMap, HashSet};

use write_fonts::read::{
    tables::gpos::{PairPos, PairPosFormat1, PairPosFormat2, ValueRecord},
    types::GlyphId16,
    FontData, ReadError,
};

use crate::variations::{self, DeltaComputer};

/// One glyph pair and its x-advance adjustment
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct PairAdjustment {
    pub first: GlyphId16,
    pub second: GlyphId16,
    pub x_advance: i32,
}

pub(super) fn get_pairpos_rules(
    subtables: &[PairPos],
    delta_computer: Option<&DeltaComputer>,
) -> Result<Vec<PairAdjustment>, ReadError> {
    // so we only take the first coverage hit in each subtable, which means
    // we just need track what we've seen.
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for sub in subtables.iter() {
        match sub {
            PairPos::Format1(sub) => {
                append_pairpos_f1_rules(sub, delta_computer, &mut seen, &mut result)?;
            }
            PairPos::Format2(sub) => {
                append_pairpos_f2_rules(sub, delta_computer, &mut seen, &mut result)?;
            }
        }
    }
    Ok(result)
}

fn x_advance(
    record: &ValueRecord,
    data: FontData,
    delta_computer: Option<&DeltaComputer>,
) -> Result<i32, ReadError> {
    variations::resolve_value(
        record.x_advance(),
        record.x_advance_device(data),
        delta_computer,
    )
}

fn append_pairpos_f1_rules(
    subtable: &PairPosFormat1,
    delta_computer: Option<&DeltaComputer>,
    seen: &mut HashSet<(GlyphId16, GlyphId16)>,
    result: &mut Vec<PairAdjustment>,
) -> Result<(), ReadError> {
    let coverage = subtable.coverage()?;
    let pairsets = subtable.pair_sets();
    for (gid1, pairset) in coverage.iter().zip(pairsets.iter()) {
        let pairset = pairset?;
        let data = pairset.offset_data();
        for pairrec in pairset.pair_value_records().iter() {
            let pairrec = pairrec?;
            let gid2 = pairrec.second_glyph();
            // if a previous subtable had a kern for this pair, skip it here
            if !seen.insert((gid1, gid2)) {
                continue;
            }
            result.push(PairAdjustment {
                first: gid1,
                second: gid2,
                x_advance: x_advance(&pairrec.value_record1, data, delta_computer)?,
            })
        }
    }
    Ok(())
}

fn append_pairpos_f2_rules(
    subtable: &PairPosFormat2,
    delta_computer: Option<&DeltaComputer>,
    seen: &mut HashSet<(GlyphId16, GlyphId16)>,
    result: &mut Vec<PairAdjustment>,
) -> Result<(), ReadError> {
    let coverage = subtable.coverage()?;
    let class1 = subtable.class_def1()?;
    let class2 = subtable.class_def2()?;
    let mut reverse_class2 = HashMap::new();
    for (gid, class) in class2.iter() {
        reverse_class2.entry(class).or_insert(Vec::new()).push(gid);
    }

    let class1records = subtable.class1_records();
    let data = subtable.offset_data();
    for gid1 in coverage.iter() {
        let g1class = class1.get(gid1);
        let class1rec = class1records.get(g1class as _)?;
        for (c2, class2rec) in class1rec.class2_records().iter().enumerate() {
            let class2rec = class2rec?;
            let value = x_advance(class2rec.value_record1(), data, delta_computer)?;
            // class pairs without an adjustment are padding, not kerning
            if value == 0 {
                continue;
            }
            for gid2 in reverse_class2
                .get(&(c2 as u16))
                .into_iter()
                .flat_map(|c2glyphs| c2glyphs.iter())
                .copied()
            {
                if !seen.insert((gid1, gid2)) {
                    continue;
                }
                result.push(PairAdjustment {
                    first: gid1,
                    second: gid2,
                    x_advance: value,
                })
            }
        }
    }
    Ok(())
}
