//! The table access capability that everything else is derived from

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use write_fonts::types::Tag;

use crate::{
    error::Error,
    types::{AxisInfo, AxisLocation, GlyphName},
};

/// One substitution rule, as a relation from inputs to a produced glyph.
///
/// Multiple substitutions (one glyph to many) are expressed as one rule per
/// produced glyph; alternates as one rule per alternate.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubstitutionRule {
    /// Glyphs that must all be present, in order, for the rule to fire.
    pub inputs: Vec<GlyphName>,
    pub output: GlyphName,
    /// Every feature whose activation would apply this rule.
    pub features: BTreeSet<Tag>,
}

/// Horizontal metrics of one glyph at the current location.
#[derive(Clone, Debug, PartialEq)]
pub struct RawGlyphMetrics {
    pub name: GlyphName,
    pub advance: i32,
    /// `(x_min, x_max)` of the outline, or `None` for an empty glyph.
    pub x_extents: Option<(i32, i32)>,
    /// Signed area enclosed by the outline; counter-clockwise contours are
    /// positive.
    pub area: f64,
}

impl RawGlyphMetrics {
    /// The horizontal extent of the outline; zero for empty glyphs.
    pub fn visual_width(&self) -> i32 {
        self.x_extents
            .map(|(min, max)| max - min)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NameRecord {
    pub name_id: u16,
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub string: String,
}

/// A flattened pair adjustment, x-advance only.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernPair {
    pub left: GlyphName,
    pub right: GlyphName,
    pub value: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    /// GPOS lookup type 4, reached from the `mark` feature
    MarkToBase,
    /// GPOS lookup type 6, reached from the `mkmk` feature
    MarkToMark,
}

/// One base glyph's anchor for one mark class, plus the marks in that class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkAttachment {
    pub base: GlyphName,
    pub base_anchor: Anchor,
    /// Marks in coverage order.
    pub marks: Vec<(GlyphName, Anchor)>,
}

/// A named scalar read from one of the font's header tables.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
    pub table: Tag,
    pub name: &'static str,
    pub value: f64,
}

/// Read access to one font resource.
///
/// Implementors are immutable: a change of variation location produces a new
/// value through [`FontSource::instantiate`].
pub trait FontSource: Sized {
    fn glyph_order(&self) -> Vec<GlyphName>;

    /// Every codepoint mapped to each glyph by the font's unicode cmaps.
    fn reverse_cmap(&self) -> HashMap<GlyphName, BTreeSet<u32>>;

    fn substitution_rules(&self) -> Vec<SubstitutionRule>;

    /// Metrics for every glyph, in glyph order.
    fn glyph_metrics(&self) -> Vec<RawGlyphMetrics>;

    /// Declared variation axes, in `fvar` order. Empty for static fonts.
    fn axes(&self) -> Vec<AxisInfo>;

    /// Returns a new resource pinned at `location`.
    ///
    /// Tags not declared by the font must already have been removed; axes
    /// missing from `location` take their default value.
    fn instantiate(&self, location: &AxisLocation) -> Result<Self, Error>;

    /// `OS/2.usWeightClass`, if present.
    fn weight_class(&self) -> Option<u16>;

    fn name_records(&self) -> Vec<NameRecord>;

    /// Pair adjustments reachable from the `kern` feature.
    fn kerning(&self) -> Vec<KernPair>;

    fn mark_attachments(&self, kind: AttachmentKind) -> Vec<MarkAttachment>;

    fn attributes(&self) -> Vec<Attribute>;

    fn is_variable(&self) -> bool {
        !self.axes().is_empty()
    }
}
