//! Layout tables and small binary fonts assembled in memory

use write_fonts::{
    tables::{
        cmap::Cmap,
        fvar::{AxisInstanceArrays, Fvar, VariationAxisRecord},
        gpos::{Gpos, PositionLookup, PositionLookupList},
        gsub::{Gsub, SubstitutionLookup, SubstitutionLookupList},
        layout::{
            CoverageTable, Feature, FeatureList, FeatureRecord, LangSys, LangSysRecord, Lookup,
            LookupFlag, Script, ScriptList, ScriptRecord,
        },
        maxp::Maxp,
        post::Post,
    },
    types::{Fixed, GlyphId, GlyphId16, NameId, Tag},
    FontBuilder,
};

use crate::{glyph_names::NameMap, types::GlyphName};

/// (feature tag, lookup indices)
pub(crate) type FeatureSpec<'a> = (&'a [u8; 4], &'a [u16]);

pub(crate) fn names(names: &[&str]) -> NameMap {
    names.iter().copied().map(GlyphName::new).collect()
}

pub(crate) fn coverage(gids: &[u16]) -> CoverageTable {
    gids.iter().copied().map(GlyphId16::new).collect()
}

pub(crate) fn gids(gids: &[u16]) -> Vec<GlyphId16> {
    gids.iter().copied().map(GlyphId16::new).collect()
}

pub(crate) fn lookup<T: Default, L: From<Lookup<T>>>(subtables: Vec<T>) -> L {
    Lookup::new(LookupFlag::empty(), subtables).into()
}

pub(crate) fn feature_list(features: &[FeatureSpec]) -> FeatureList {
    FeatureList::new(
        features
            .iter()
            .map(|(tag, lookups)| {
                FeatureRecord::new(Tag::new(tag), Feature::new(None, lookups.to_vec()))
            })
            .collect(),
    )
}

/// `DFLT` enabling `default` and `latn` with a `TRK ` language system
/// enabling `turkish`.
pub(crate) fn script_list(default: &[u16], turkish: &[u16]) -> ScriptList {
    let dflt = Script::new(Some(LangSys::new(default.to_vec())), Vec::new());
    let latn = Script::new(
        None,
        vec![LangSysRecord::new(
            Tag::new(b"TRK "),
            LangSys::new(turkish.to_vec()),
        )],
    );
    ScriptList::new(vec![
        ScriptRecord::new(Tag::new(b"DFLT"), dflt),
        ScriptRecord::new(Tag::new(b"latn"), latn),
    ])
}

// every feature enabled under DFLT
fn enabled(features: &[FeatureSpec]) -> (ScriptList, FeatureList) {
    let indices = (0..features.len() as u16).collect::<Vec<_>>();
    (script_list(&indices, &[]), feature_list(features))
}

pub(crate) fn gsub_bytes(features: &[FeatureSpec], lookups: Vec<SubstitutionLookup>) -> Vec<u8> {
    let (scripts, features) = enabled(features);
    let gsub = Gsub::new(scripts, features, SubstitutionLookupList::new(lookups));
    write_fonts::dump_table(&gsub).unwrap()
}

pub(crate) fn gpos_bytes(features: &[FeatureSpec], lookups: Vec<PositionLookup>) -> Vec<u8> {
    let (scripts, features) = enabled(features);
    let gpos = Gpos::new(scripts, features, PositionLookupList::new(lookups));
    write_fonts::dump_table(&gpos).unwrap()
}

/// A font with only the tables needed to name, map and shape its glyphs.
pub(crate) struct TestFont<'a> {
    num_glyphs: u16,
    post_names: Option<&'a [&'a str]>,
    mappings: Vec<(char, GlyphId)>,
    axes: Vec<VariationAxisRecord>,
    raw: Vec<(Tag, Vec<u8>)>,
}

impl<'a> TestFont<'a> {
    pub(crate) fn new(num_glyphs: u16) -> Self {
        TestFont {
            num_glyphs,
            post_names: None,
            mappings: Vec::new(),
            axes: Vec::new(),
            raw: Vec::new(),
        }
    }

    pub(crate) fn post_names(mut self, names: &'a [&'a str]) -> Self {
        self.post_names = Some(names);
        self
    }

    pub(crate) fn map(mut self, c: char, gid: u32) -> Self {
        self.mappings.push((c, GlyphId::new(gid)));
        self
    }

    pub(crate) fn axis(mut self, tag: &[u8; 4], min: i32, default: i32, max: i32) -> Self {
        self.axes.push(VariationAxisRecord::new(
            Tag::new(tag),
            Fixed::from_i32(min),
            Fixed::from_i32(default),
            Fixed::from_i32(max),
            0,
            NameId::new(256),
        ));
        self
    }

    pub(crate) fn table(mut self, tag: &[u8; 4], bytes: Vec<u8>) -> Self {
        self.raw.push((Tag::new(tag), bytes));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut builder = FontBuilder::new();
        builder.add_table(&Maxp::new(self.num_glyphs)).unwrap();
        if let Some(names) = self.post_names {
            builder
                .add_table(&Post::new_v2(names.iter().copied()))
                .unwrap();
        }
        if !self.mappings.is_empty() {
            builder
                .add_table(&Cmap::from_mappings(self.mappings).unwrap())
                .unwrap();
        }
        if !self.axes.is_empty() {
            let fvar = Fvar::new(AxisInstanceArrays::new(self.axes, Vec::new()));
            builder.add_table(&fvar).unwrap();
        }
        for (tag, bytes) in self.raw {
            builder.add_raw(tag, bytes);
        }
        builder.build()
    }
}
