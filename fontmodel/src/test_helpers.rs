//! An in-memory font for exercising the resolver and the model

use std::collections::{BTreeSet, HashMap};

use write_fonts::types::Tag;

use crate::{
    error::Error,
    source::{
        Anchor, Attribute, AttachmentKind, FontSource, KernPair, MarkAttachment, NameRecord,
        RawGlyphMetrics, SubstitutionRule,
    },
    types::{AxisInfo, AxisLocation, GlyphName},
};

const WGHT: Tag = Tag::new(b"wght");

/// Builder style fake font.
///
/// Advances may vary with `wght`: each unit away from the axis default adds
/// the glyph's weight slope to its advance.
#[derive(Clone, Debug, Default)]
pub struct MockFont {
    glyphs: Vec<RawGlyphMetrics>,
    cmap: HashMap<GlyphName, BTreeSet<u32>>,
    rules: Vec<SubstitutionRule>,
    axes: Vec<AxisInfo>,
    location: AxisLocation,
    slopes: HashMap<GlyphName, f32>,
    weight_class: Option<u16>,
    names: Vec<NameRecord>,
    kerning: Vec<KernPair>,
    marks: Vec<MarkAttachment>,
    mkmks: Vec<MarkAttachment>,
    attributes: Vec<Attribute>,
}

impl MockFont {
    pub fn new() -> Self {
        Default::default()
    }

    /// A glyph encoded with `c`, with an outline spanning its advance.
    pub fn glyph(self, name: &str, c: char, advance: i32) -> Self {
        self.glyph_without_char(name, advance).codepoint(name, c as u32)
    }

    pub fn glyph_without_char(mut self, name: &str, advance: i32) -> Self {
        self.glyphs.push(RawGlyphMetrics {
            name: name.into(),
            advance,
            x_extents: (advance > 0).then_some((0, advance)),
            area: 0.0,
        });
        self
    }

    pub fn codepoint(mut self, name: &str, cp: u32) -> Self {
        self.cmap.entry(name.into()).or_default().insert(cp);
        self
    }

    pub fn extents(mut self, name: &str, x_min: i32, x_max: i32) -> Self {
        if let Some(glyph) = self.glyphs.iter_mut().find(|g| g.name.as_str() == name) {
            glyph.x_extents = Some((x_min, x_max));
        }
        self
    }

    pub fn area(mut self, name: &str, area: f64) -> Self {
        if let Some(glyph) = self.glyphs.iter_mut().find(|g| g.name.as_str() == name) {
            glyph.area = area;
        }
        self
    }

    pub fn rule(mut self, inputs: &[&str], output: &str, features: &[&[u8; 4]]) -> Self {
        self.rules.push(SubstitutionRule {
            inputs: inputs.iter().copied().map(GlyphName::new).collect(),
            output: output.into(),
            features: features.iter().map(|tag| Tag::new(tag)).collect(),
        });
        self
    }

    pub fn axis(mut self, tag: &[u8; 4], min: f32, default: f32, max: f32) -> Self {
        self.axes.push(AxisInfo {
            tag: Tag::new(tag),
            min,
            default,
            max,
        });
        self
    }

    pub fn weight_slope(mut self, name: &str, slope: f32) -> Self {
        self.slopes.insert(name.into(), slope);
        self
    }

    pub fn with_weight_class(mut self, weight_class: u16) -> Self {
        self.weight_class = Some(weight_class);
        self
    }

    pub fn name(mut self, name_id: u16, string: &str) -> Self {
        self.names.push(NameRecord {
            name_id,
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x409,
            string: string.into(),
        });
        self
    }

    pub fn kern(mut self, left: &str, right: &str, value: i32) -> Self {
        self.kerning.push(KernPair {
            left: left.into(),
            right: right.into(),
            value,
        });
        self
    }

    pub fn mark(
        mut self,
        kind: AttachmentKind,
        base: &str,
        base_anchor: (i32, i32),
        marks: &[(&str, (i32, i32))],
    ) -> Self {
        let attachment = MarkAttachment {
            base: base.into(),
            base_anchor: Anchor {
                x: base_anchor.0,
                y: base_anchor.1,
            },
            marks: marks
                .iter()
                .map(|(name, (x, y))| (GlyphName::new(name), Anchor { x: *x, y: *y }))
                .collect(),
        };
        match kind {
            AttachmentKind::MarkToBase => self.marks.push(attachment),
            AttachmentKind::MarkToMark => self.mkmks.push(attachment),
        }
        self
    }

    pub fn attribute(mut self, table: &[u8; 4], name: &'static str, value: f64) -> Self {
        self.attributes.push(Attribute {
            table: Tag::new(table),
            name,
            value,
        });
        self
    }

    fn wght_offset(&self) -> f32 {
        let Some(axis) = self.axes.iter().find(|axis| axis.tag == WGHT) else {
            return 0.0;
        };
        self.location
            .get(&WGHT)
            .map(|value| value.clamp(axis.min, axis.max) - axis.default)
            .unwrap_or_default()
    }
}

impl FontSource for MockFont {
    fn glyph_order(&self) -> Vec<GlyphName> {
        self.glyphs.iter().map(|g| g.name.clone()).collect()
    }

    fn reverse_cmap(&self) -> HashMap<GlyphName, BTreeSet<u32>> {
        self.cmap.clone()
    }

    fn substitution_rules(&self) -> Vec<SubstitutionRule> {
        self.rules.clone()
    }

    fn glyph_metrics(&self) -> Vec<RawGlyphMetrics> {
        let offset = self.wght_offset();
        self.glyphs
            .iter()
            .map(|glyph| {
                let slope = self.slopes.get(&glyph.name).copied().unwrap_or_default();
                RawGlyphMetrics {
                    advance: glyph.advance + (slope * offset).round() as i32,
                    ..glyph.clone()
                }
            })
            .collect()
    }

    fn axes(&self) -> Vec<AxisInfo> {
        self.axes.clone()
    }

    fn instantiate(&self, location: &AxisLocation) -> Result<Self, Error> {
        Ok(MockFont {
            location: location.clone(),
            ..self.clone()
        })
    }

    fn weight_class(&self) -> Option<u16> {
        self.weight_class
    }

    fn name_records(&self) -> Vec<NameRecord> {
        self.names.clone()
    }

    fn kerning(&self) -> Vec<KernPair> {
        self.kerning.clone()
    }

    fn mark_attachments(&self, kind: AttachmentKind) -> Vec<MarkAttachment> {
        match kind {
            AttachmentKind::MarkToBase => self.marks.clone(),
            AttachmentKind::MarkToMark => self.mkmks.clone(),
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        self.attributes.clone()
    }
}
