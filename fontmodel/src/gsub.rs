//! Substitution rules from the GSUB table

use std::collections::{BTreeSet, HashSet};

use write_fonts::{
    read::{
        tables::gsub::{
            AlternateSubstFormat1, Gsub, LigatureSubstFormat1, MultipleSubstFormat1, SingleSubst,
            SubstitutionSubtables,
        },
        ReadError,
    },
    types::{GlyphId16, Tag},
};

use crate::{common, glyph_names::NameMap, source::SubstitutionRule};

/// A rule in terms of glyph ids, before names and features are attached
#[derive(Clone, Debug, PartialEq, Eq)]
struct RawRule {
    inputs: Vec<GlyphId16>,
    output: GlyphId16,
}

/// Collect every single, multiple, alternate and ligature substitution
/// reachable from a feature.
pub(crate) fn substitution_rules(
    table: &Gsub,
    names: &NameMap,
) -> Result<Vec<SubstitutionRule>, ReadError> {
    let script_list = table.script_list()?;
    let feature_list = table.feature_list()?;
    let features_by_lookup = common::features_by_lookup(&script_list, &feature_list)?;
    let lookup_list = table.lookup_list()?;

    let mut result = Vec::new();
    for (id, lookup) in lookup_list.lookups().iter().enumerate() {
        let Some(features) = u16::try_from(id)
            .ok()
            .and_then(|id| features_by_lookup.get(&id))
        else {
            log::trace!("lookup {id} is not referenced by any feature");
            continue;
        };
        let rules = match lookup?.subtables()? {
            SubstitutionSubtables::Single(subs) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                get_singlesub_rules(&subs)?
            }
            SubstitutionSubtables::Multiple(subs) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                get_multisub_rules(&subs)?
            }
            SubstitutionSubtables::Alternate(subs) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                get_alternate_rules(&subs)?
            }
            SubstitutionSubtables::Ligature(subs) => {
                let subs = subs.iter().flat_map(|sub| sub.ok()).collect::<Vec<_>>();
                get_ligature_rules(&subs)?
            }
            _ => continue,
        };
        result.extend(
            rules
                .into_iter()
                .filter_map(|rule| name_rule(rule, features, names)),
        );
    }
    Ok(result)
}

fn name_rule(
    rule: RawRule,
    features: &BTreeSet<Tag>,
    names: &NameMap,
) -> Option<SubstitutionRule> {
    let inputs = rule
        .inputs
        .iter()
        .map(|gid| names.get(*gid).cloned())
        .collect::<Option<Vec<_>>>();
    let output = names.get(rule.output).cloned();
    match (inputs, output) {
        (Some(inputs), Some(output)) => Some(SubstitutionRule {
            inputs,
            output,
            features: features.clone(),
        }),
        _ => {
            log::warn!("substitution references a glyph outside the font: {rule:?}");
            None
        }
    }
}

fn get_singlesub_rules(subtables: &[SingleSubst]) -> Result<Vec<RawRule>, ReadError> {
    // so we only take the first coverage hit in each subtable, which means
    // we just need track what we've seen.
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for sub in subtables {
        match sub {
            SingleSubst::Format1(sub) => {
                let delta = sub.delta_glyph_id() as i32;
                for target in sub.coverage()?.iter() {
                    let out = (target.to_u16() as i32) + delta;
                    // delta arithmetic is modulo 65536
                    let out = GlyphId16::new(out.rem_euclid(0x10000) as u16);
                    if seen.insert(target) {
                        result.push(RawRule {
                            inputs: vec![target],
                            output: out,
                        });
                    }
                }
            }
            SingleSubst::Format2(sub) => {
                let coverage = sub.coverage()?;
                for (target, replacement) in coverage.iter().zip(sub.substitute_glyph_ids()) {
                    if seen.insert(target) {
                        result.push(RawRule {
                            inputs: vec![target],
                            output: replacement.get(),
                        });
                    }
                }
            }
        }
    }
    Ok(result)
}

fn get_multisub_rules(subtables: &[MultipleSubstFormat1]) -> Result<Vec<RawRule>, ReadError> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for sub in subtables {
        let coverage = sub.coverage()?;
        for (target, sequence) in coverage.iter().zip(sub.sequences().iter()) {
            let sequence = sequence?;
            if !seen.insert(target) {
                continue;
            }
            // every glyph of the sequence is produced by the same input
            result.extend(
                sequence
                    .substitute_glyph_ids()
                    .iter()
                    .map(|gid| RawRule {
                        inputs: vec![target],
                        output: gid.get(),
                    }),
            );
        }
    }

    Ok(result)
}

fn get_alternate_rules(subtables: &[AlternateSubstFormat1]) -> Result<Vec<RawRule>, ReadError> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for sub in subtables {
        let coverage = sub.coverage()?;
        for (target, alternates) in coverage.iter().zip(sub.alternate_sets().iter()) {
            let alternates = alternates?;
            if !seen.insert(target) {
                continue;
            }
            result.extend(
                alternates
                    .alternate_glyph_ids()
                    .iter()
                    .map(|gid| RawRule {
                        inputs: vec![target],
                        output: gid.get(),
                    }),
            );
        }
    }

    Ok(result)
}

fn get_ligature_rules(subtables: &[LigatureSubstFormat1]) -> Result<Vec<RawRule>, ReadError> {
    let mut result = Vec::new();
    // a ligature is shadowed if an earlier subtable has the same component sequence
    let mut seen = HashSet::new();

    for sub in subtables {
        let coverage = sub.coverage()?;
        for (first, ligatures) in coverage.iter().zip(sub.ligature_sets().iter()) {
            let ligatures = ligatures?;
            for ligature in ligatures.ligatures().iter() {
                let ligature = ligature?;
                let inputs = std::iter::once(first)
                    .chain(
                        ligature
                            .component_glyph_ids()
                            .iter()
                            .map(|gid| gid.get()),
                    )
                    .collect::<Vec<_>>();
                if seen.insert(inputs.clone()) {
                    result.push(RawRule {
                        inputs,
                        output: ligature.ligature_glyph(),
                    });
                }
            }
        }
    }

    Ok(result)
}
