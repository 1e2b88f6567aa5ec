//! general common utilities shared by GSUB and GPOS extraction

use std::collections::{BTreeSet, HashMap};

use write_fonts::{
    read::{
        tables::layout::{FeatureList, ScriptList},
        ReadError,
    },
    types::Tag,
};

/// For each lookup index, the features that reference it.
///
/// Only features reachable from some script/language system are considered;
/// a lookup that appears in no such feature is absent from the map.
pub(crate) fn features_by_lookup(
    script_list: &ScriptList,
    feature_list: &FeatureList,
) -> Result<HashMap<u16, BTreeSet<Tag>>, ReadError> {
    let data = script_list.offset_data();
    let mut feature_indices = BTreeSet::new();

    for script in script_list.script_records() {
        let script = script.script(data)?;
        if let Some(dflt) = script.default_lang_sys().transpose()? {
            feature_indices.extend(dflt.feature_indices().iter().map(|idx| idx.get()));
        }
        for lang_sys in script.lang_sys_records() {
            let lang = lang_sys.lang_sys(script.offset_data())?;
            feature_indices.extend(lang.feature_indices().iter().map(|idx| idx.get()));
        }
    }

    let mut result = HashMap::<_, BTreeSet<_>>::new();
    for idx in feature_indices {
        let Some(rec) = feature_list.feature_records().get(idx as usize) else {
            log::warn!("feature index {idx} out of bounds");
            continue;
        };
        let feature = rec.feature(feature_list.offset_data())?;
        for lookup in feature.lookup_list_indices() {
            result
                .entry(lookup.get())
                .or_default()
                .insert(rec.feature_tag());
        }
    }
    Ok(result)
}

/// The lookups referenced by a single feature, in lookup list order.
pub(crate) fn lookups_for_feature(
    features_by_lookup: &HashMap<u16, BTreeSet<Tag>>,
    feature: Tag,
) -> BTreeSet<u16> {
    features_by_lookup
        .iter()
        .filter(|(_, features)| features.contains(&feature))
        .map(|(lookup, _)| *lookup)
        .collect()
}
