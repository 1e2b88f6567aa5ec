//! [`FontSource`] for compiled OpenType fonts

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
    sync::Arc,
};

use skrifa::{
    outline::{DrawSettings, OutlinePen},
    prelude::{LocationRef, Size},
    GlyphId, MetadataProvider,
};
use write_fonts::{
    read::{FileRef, FontRef, ReadError, TableProvider},
    types::{F2Dot14, Tag},
};

use crate::{
    error::Error,
    glyph_names::{self, NameMap},
    gpos, gsub,
    source::{
        Attribute, AttachmentKind, FontSource, KernPair, MarkAttachment, NameRecord,
        RawGlyphMetrics, SubstitutionRule,
    },
    types::{AxisInfo, AxisLocation, GlyphName},
};

/// A compiled font, optionally pinned at a location in its design space.
///
/// Instances made by [`FontSource::instantiate`] share the underlying bytes
/// and glyph names; only the normalized coordinates differ.
#[derive(Clone)]
pub struct BinaryFont {
    data: Arc<[u8]>,
    index: u32,
    names: Arc<NameMap>,
    coords: Vec<F2Dot14>,
}

impl BinaryFont {
    /// Read the font at `path`; `index` selects a member of a collection.
    pub fn load(path: impl AsRef<Path>, index: Option<u32>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|inner| Error::Load {
            path: path.to_owned(),
            inner,
        })?;
        log::debug!("read {} bytes from {}", data.len(), path.display());
        Self::from_bytes(data, index.unwrap_or_default())
    }

    pub fn from_bytes(data: impl Into<Arc<[u8]>>, index: u32) -> Result<Self, Error> {
        let data = data.into();
        let names = {
            let font = font_from_bytes(&data, index)?;
            NameMap::from_font(&font)?
        };
        Ok(BinaryFont {
            data,
            index,
            names: Arc::new(names),
            coords: Vec::new(),
        })
    }

    fn font(&self) -> FontRef<'_> {
        // the same bytes and index were parsed successfully in from_bytes
        font_from_bytes(&self.data, self.index).expect("font validated on load")
    }

    fn location(&self) -> LocationRef<'_> {
        LocationRef::new(&self.coords)
    }
}

fn font_from_bytes(bytes: &[u8], index: u32) -> Result<FontRef<'_>, Error> {
    let font = FileRef::new(bytes).map_err(Error::FontRead)?;
    match (font, index) {
        (FileRef::Font(font), 0) => Ok(font),
        (FileRef::Font(_), other) => Err(Error::FontRead(ReadError::InvalidCollectionIndex(other))),
        (FileRef::Collection(collection), idx) => collection.get(idx).map_err(Error::FontRead),
    }
}

/// Log a table that failed to parse and carry on without it.
fn or_warn<T: Default>(result: Result<T, ReadError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("could not read {what}: {e}");
        T::default()
    })
}

impl FontSource for BinaryFont {
    fn glyph_order(&self) -> Vec<GlyphName> {
        self.names.iter().map(|(_, name)| name.clone()).collect()
    }

    fn reverse_cmap(&self) -> HashMap<GlyphName, BTreeSet<u32>> {
        glyph_names::reverse_cmap(&self.font())
            .into_iter()
            .filter_map(|(gid, cps)| Some((self.names.get(gid)?.clone(), cps)))
            .collect()
    }

    fn substitution_rules(&self) -> Vec<SubstitutionRule> {
        let font = self.font();
        let Ok(gsub) = font.gsub() else {
            return Vec::new();
        };
        or_warn(gsub::substitution_rules(&gsub, &self.names), "GSUB")
    }

    fn glyph_metrics(&self) -> Vec<RawGlyphMetrics> {
        let font = self.font();
        let metrics = font.glyph_metrics(Size::unscaled(), self.location());
        let outlines = font.outline_glyphs();
        self.names
            .iter()
            .map(|(gid, name)| {
                let gid = GlyphId::from(gid);
                let mut pen = MeasurePen::default();
                if let Some(outline) = outlines.get(gid) {
                    let settings = DrawSettings::unhinted(Size::unscaled(), self.location());
                    if let Err(e) = outline.draw(settings, &mut pen) {
                        log::warn!("could not draw '{name}': {e}");
                    }
                }
                RawGlyphMetrics {
                    name: name.clone(),
                    advance: metrics
                        .advance_width(gid)
                        .map(|adv| adv.round() as i32)
                        .unwrap_or_default(),
                    x_extents: pen.x_extents(),
                    area: pen.area,
                }
            })
            .collect()
    }

    fn axes(&self) -> Vec<AxisInfo> {
        self.font()
            .axes()
            .iter()
            .map(|axis| AxisInfo {
                tag: axis.tag(),
                min: axis.min_value(),
                default: axis.default_value(),
                max: axis.max_value(),
            })
            .collect()
    }

    fn instantiate(&self, location: &AxisLocation) -> Result<Self, Error> {
        let coords = self
            .font()
            .axes()
            .location(location.iter().map(|(tag, value)| (*tag, *value)))
            .coords()
            .to_vec();
        log::debug!("pinned at {location:?}, normalized {coords:?}");
        Ok(BinaryFont {
            coords,
            ..self.clone()
        })
    }

    fn weight_class(&self) -> Option<u16> {
        self.font().os2().ok().map(|os2| os2.us_weight_class())
    }

    fn name_records(&self) -> Vec<NameRecord> {
        let font = self.font();
        let Ok(name) = font.name() else {
            log::warn!("font has no name table");
            return Vec::new();
        };
        let data = name.string_data();
        name.name_record()
            .iter()
            .filter_map(|record| {
                let string = match record.string(data) {
                    Ok(string) => string.to_string(),
                    Err(e) => {
                        log::warn!("unreadable name {}: {e}", record.name_id().to_u16());
                        return None;
                    }
                };
                Some(NameRecord {
                    name_id: record.name_id().to_u16(),
                    platform_id: record.platform_id(),
                    encoding_id: record.encoding_id(),
                    language_id: record.language_id(),
                    string,
                })
            })
            .collect()
    }

    fn kerning(&self) -> Vec<KernPair> {
        let font = self.font();
        let Ok(gpos) = font.gpos() else {
            return Vec::new();
        };
        let gdef = font.gdef().ok();
        or_warn(
            gpos::kerning(&gpos, gdef.as_ref(), &self.names, &self.coords),
            "kerning",
        )
    }

    fn mark_attachments(&self, kind: AttachmentKind) -> Vec<MarkAttachment> {
        let font = self.font();
        let Ok(gpos) = font.gpos() else {
            return Vec::new();
        };
        let gdef = font.gdef().ok();
        or_warn(
            gpos::mark_attachments(&gpos, gdef.as_ref(), &self.names, &self.coords, kind),
            "mark attachments",
        )
    }

    fn attributes(&self) -> Vec<Attribute> {
        let font = self.font();
        let mut result = Vec::new();
        let mut push = |table: &[u8; 4], name: &'static str, value: f64| {
            result.push(Attribute {
                table: Tag::new(table),
                name,
                value,
            })
        };

        if let Ok(head) = font.head() {
            push(b"head", "unitsPerEm", head.units_per_em().into());
            push(b"head", "fontRevision", head.font_revision().to_f64());
            push(b"head", "xMin", head.x_min().into());
            push(b"head", "yMin", head.y_min().into());
            push(b"head", "xMax", head.x_max().into());
            push(b"head", "yMax", head.y_max().into());
            push(b"head", "macStyle", head.mac_style().bits().into());
            push(b"head", "lowestRecPPEM", head.lowest_rec_ppem().into());
        }
        if let Ok(hhea) = font.hhea() {
            push(b"hhea", "ascent", hhea.ascender().to_i16().into());
            push(b"hhea", "descent", hhea.descender().to_i16().into());
            push(b"hhea", "lineGap", hhea.line_gap().to_i16().into());
            push(b"hhea", "advanceWidthMax", hhea.advance_width_max().to_u16().into());
            push(b"hhea", "caretSlopeRise", hhea.caret_slope_rise().into());
            push(b"hhea", "caretSlopeRun", hhea.caret_slope_run().into());
        }
        if let Ok(os2) = font.os2() {
            push(b"OS/2", "xAvgCharWidth", os2.x_avg_char_width().into());
            push(b"OS/2", "usWeightClass", os2.us_weight_class().into());
            push(b"OS/2", "usWidthClass", os2.us_width_class().into());
            push(b"OS/2", "fsType", os2.fs_type().into());
            push(b"OS/2", "sTypoAscender", os2.s_typo_ascender().into());
            push(b"OS/2", "sTypoDescender", os2.s_typo_descender().into());
            push(b"OS/2", "sTypoLineGap", os2.s_typo_line_gap().into());
            push(b"OS/2", "usWinAscent", os2.us_win_ascent().into());
            push(b"OS/2", "usWinDescent", os2.us_win_descent().into());
            push(b"OS/2", "yStrikeoutSize", os2.y_strikeout_size().into());
            push(b"OS/2", "yStrikeoutPosition", os2.y_strikeout_position().into());
            if let Some(x_height) = os2.sx_height() {
                push(b"OS/2", "sxHeight", x_height.into());
            }
            if let Some(cap_height) = os2.s_cap_height() {
                push(b"OS/2", "sCapHeight", cap_height.into());
            }
        }
        if let Ok(post) = font.post() {
            push(b"post", "italicAngle", post.italic_angle().to_f64());
            push(b"post", "underlinePosition", post.underline_position().to_i16().into());
            push(b"post", "underlineThickness", post.underline_thickness().to_i16().into());
            push(b"post", "isFixedPitch", post.is_fixed_pitch().into());
        }
        result
    }
}

impl std::fmt::Debug for BinaryFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryFont")
            .field("len", &self.data.len())
            .field("index", &self.index)
            .field("coords", &self.coords)
            .finish()
    }
}

/// Collects the horizontal control box and the enclosed area of an outline.
///
/// The control box includes off-curve points, matching what `glyf` records
/// in its glyph headers.
#[derive(Default)]
struct MeasurePen {
    x_range: Option<(f32, f32)>,
    area: f64,
    start: (f64, f64),
    current: (f64, f64),
}

impl MeasurePen {
    fn add_x(&mut self, x: f32) {
        self.x_range = Some(match self.x_range {
            Some((min, max)) => (min.min(x), max.max(x)),
            None => (x, x),
        });
    }

    fn x_extents(&self) -> Option<(i32, i32)> {
        self.x_range
            .map(|(min, max)| (min.round() as i32, max.round() as i32))
    }

    fn line_area(&mut self, x: f64, y: f64) {
        let (x0, y0) = self.current;
        self.area -= (x - x0) * (y + y0) * 0.5;
        self.current = (x, y);
    }
}

impl OutlinePen for MeasurePen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.add_x(x);
        self.start = (x as f64, y as f64);
        self.current = self.start;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.add_x(x);
        self.line_area(x as f64, y as f64);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.add_x(cx0);
        self.add_x(x);
        let (x0, y0) = self.current;
        let (x1, y1) = (cx0 as f64 - x0, cy0 as f64 - y0);
        let (x2, y2) = (x as f64 - x0, y as f64 - y0);
        self.area -= (x2 * y1 - x1 * y2) / 3.0;
        self.line_area(x as f64, y as f64);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.add_x(cx0);
        self.add_x(cx1);
        self.add_x(x);
        let (x0, y0) = self.current;
        let (x1, y1) = (cx0 as f64 - x0, cy0 as f64 - y0);
        let (x2, y2) = (cx1 as f64 - x0, cy1 as f64 - y0);
        let (x3, y3) = (x as f64 - x0, y as f64 - y0);
        self.area -= (x1 * (-y2 - y3) + x2 * (y1 - 2.0 * y3) + x3 * (y1 + 2.0 * y2)) * 0.15;
        self.line_area(x as f64, y as f64);
    }

    fn close(&mut self) {
        let (x, y) = self.start;
        self.line_area(x, y);
    }
}
