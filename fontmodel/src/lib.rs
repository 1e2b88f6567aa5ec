//! Shaping inputs and comparable tables for compiled fonts
//!
//! A [`FontModel`] owns one font, pins it at a variation location on request,
//! and derives from it a [`GlyphInput`] for every glyph (the text and features
//! a shaper needs to produce that glyph) along with name, metric, kerning,
//! mark and header tables suitable for comparing two fonts.

mod binary;
mod common;
mod error;
mod glyph_input;
mod glyph_names;
mod gpos;
mod gsub;
mod model;
mod resolver;
mod source;
mod substitution;
mod tables;
mod types;
mod variations;

#[cfg(test)]
mod test_fonts;
#[cfg(any(test, feature = "test"))]
pub mod test_helpers;

pub use binary::BinaryFont;
pub use error::{Diagnostic, Error};
pub use glyph_input::GlyphInput;
pub use model::FontModel;
pub use resolver::InputResolver;
pub use source::{
    Anchor, AttachmentKind, Attribute, FontSource, KernPair, MarkAttachment, NameRecord,
    RawGlyphMetrics, SubstitutionRule,
};
pub use substitution::{RuleInputs, SubstitutionGraph};
pub use tables::{DerivedTables, GlyphRecord, KernRecord, MarkRecord, MetricsRecord};
pub use types::{AxisInfo, AxisLocation, GlyphName, SnapshotId};
