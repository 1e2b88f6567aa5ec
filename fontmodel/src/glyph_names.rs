//! Human readable names for glyphs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use write_fonts::read::{
    tables::cmap::{CmapSubtable, EncodingRecord, PlatformId},
    types::{GlyphId16, Tag},
    FontRef, TableProvider,
};

use crate::{error::Error, types::GlyphName};

/// A map for gids to human-readable names
#[derive(Clone, Debug, Default)]
pub(crate) struct NameMap(BTreeMap<GlyphId16, GlyphName>);

impl NameMap {
    /// Create a new name mapping for the glyphs in the provided font
    pub(crate) fn from_font(font: &FontRef) -> Result<NameMap, Error> {
        let num_glyphs = font
            .maxp()
            .map_err(|_| Error::MissingTable(Tag::new(b"maxp")))?
            .num_glyphs();
        let reverse_cmap = reverse_cmap(font);
        let post = font.post().ok();
        let mut name_map = (1..num_glyphs)
            .map(|gid| {
                let gid = GlyphId16::new(gid);
                // first check post, then do fallback
                if let Some(name) = post
                    .as_ref()
                    .and_then(|post| post.glyph_name(gid).map(GlyphName::from))
                {
                    return (gid, name);
                }
                // fallback to the lowest codepoint, or gid
                let name = match reverse_cmap.get(&gid).and_then(|cps| cps.first()) {
                    Some(&raw) if raw <= 0xFFFF => smol_str::format_smolstr!("uni{raw:04X}"),
                    Some(&raw) => smol_str::format_smolstr!("u{raw:X}"),
                    None => smol_str::format_smolstr!("glyph.{:05}", gid.to_u16()),
                };
                (gid, name.into())
            })
            .collect::<BTreeMap<_, _>>();
        name_map.insert(GlyphId16::NOTDEF, GlyphName::NOTDEF);

        // a malformed post table can repeat names; later glyphs get a suffix
        let mut seen = HashSet::new();
        for name in name_map.values_mut() {
            if seen.insert(name.clone()) {
                continue;
            }
            let mut n = 1;
            let unique = loop {
                let candidate = GlyphName::from(smol_str::format_smolstr!("{name}#{n}"));
                if !seen.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            log::warn!("duplicate glyph name '{name}', using '{unique}'");
            seen.insert(unique.clone());
            *name = unique;
        }

        Ok(NameMap(name_map))
    }

    /// Returns a human readable name for this gid, if it is in the font.
    pub(crate) fn get(&self, gid: GlyphId16) -> Option<&GlyphName> {
        self.0.get(&gid)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (GlyphId16, &GlyphName)> + '_ {
        self.0.iter().map(|(gid, name)| (*gid, name))
    }
}

impl FromIterator<GlyphName> for NameMap {
    fn from_iter<T: IntoIterator<Item = GlyphName>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .enumerate()
                .map(|(i, name)| (GlyphId16::new(i as _), name))
                .collect(),
        )
    }
}

/// Every unicode codepoint mapped to each glyph.
pub(crate) fn reverse_cmap(font: &FontRef) -> HashMap<GlyphId16, BTreeSet<u32>> {
    // <https://github.com/fonttools/fonttools/blob/6fa1a76e061c2e84243d8cac/Lib/fontTools/ttLib/tables/_c_m_a_p.py#L334>
    fn is_unicode(record: &&EncodingRecord) -> bool {
        record.platform_id() == PlatformId::Unicode
            || record.platform_id() == PlatformId::Windows
                && [0, 1, 10].contains(&record.encoding_id())
    }

    let mut reverse_cmap = HashMap::<_, BTreeSet<_>>::new();
    let Ok(cmap) = font.cmap() else {
        log::warn!("font has no cmap table, no glyph has a direct input");
        return reverse_cmap;
    };
    let offset_data = cmap.offset_data();

    let mut add_to_map = |(unicode, gid): (u32, GlyphId16)| {
        reverse_cmap.entry(gid).or_default().insert(unicode);
    };

    for subtable in cmap
        .encoding_records()
        .iter()
        .filter(is_unicode)
        .filter_map(|rec| rec.subtable(offset_data).ok())
    {
        match subtable {
            CmapSubtable::Format4(subtable) => subtable
                .iter()
                .filter_map(|(unicode, gid)| Some((unicode, GlyphId16::try_from(gid).ok()?)))
                .for_each(&mut add_to_map),
            CmapSubtable::Format12(subtable) => subtable
                .iter()
                .filter_map(|(unicode, gid)| Some((unicode, GlyphId16::try_from(gid).ok()?)))
                .for_each(&mut add_to_map),
            _ => (),
        }
    }

    reverse_cmap
}
