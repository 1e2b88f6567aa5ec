//! One font, its variation state, and everything derived from it

use std::path::Path;

use indexmap::IndexMap;
use write_fonts::types::Tag;

use crate::{
    binary::BinaryFont,
    error::{Diagnostic, Error},
    glyph_input::GlyphInput,
    resolver::InputResolver,
    source::{Attribute, FontSource, NameRecord},
    tables::{DerivedTables, GlyphRecord, KernRecord, MarkRecord, MetricsRecord},
    types::{AxisLocation, GlyphName, SnapshotId},
};

const WGHT: Tag = Tag::new(b"wght");

/// A font resource plus the inputs and tables derived from it.
///
/// Changing the variation location replaces the resource and rebuilds every
/// derived table before returning.
#[derive(Debug)]
pub struct FontModel<S: FontSource = BinaryFont> {
    /// The font as loaded; instances are always made from this.
    source: S,
    /// The font at the current location.
    font: S,
    snapshot: SnapshotId,
    axis_order: Vec<Tag>,
    axis_locations: AxisLocation,
    resolver: InputResolver,
    tables: DerivedTables,
}

impl FontModel<BinaryFont> {
    /// Load a font file; `index` selects a member of a collection.
    pub fn load(path: impl AsRef<Path>, index: Option<u32>) -> Result<Self, Error> {
        BinaryFont::load(path, index).map(FontModel::new)
    }

    pub fn from_bytes(data: impl Into<std::sync::Arc<[u8]>>, index: u32) -> Result<Self, Error> {
        BinaryFont::from_bytes(data, index).map(FontModel::new)
    }
}

impl<S: FontSource + Clone> FontModel<S> {
    pub fn new(source: S) -> Self {
        let snapshot = SnapshotId::default().next();
        let axis_order = source.axes().iter().map(|axis| axis.tag).collect();
        let font = source.clone();
        let (resolver, tables) = derive(&font, snapshot);
        FontModel {
            source,
            font,
            snapshot,
            axis_order,
            axis_locations: AxisLocation::new(),
            resolver,
            tables,
        }
    }
}

impl<S: FontSource> FontModel<S> {
    pub fn is_variable(&self) -> bool {
        self.source.is_variable()
    }

    /// Pin the font at a location in user space.
    ///
    /// Axes not mentioned take their default. Tags the font does not declare
    /// are reported and skipped; the rest of the request still applies. On a
    /// static font nothing changes.
    pub fn set_variations(
        &mut self,
        axes: impl IntoIterator<Item = (Tag, f32)>,
    ) -> Result<Vec<Diagnostic>, Error> {
        let mut diagnostics = Vec::new();
        if !self.is_variable() {
            report(&mut diagnostics, Diagnostic::UnsupportedOperation("set_variations"));
            return Ok(diagnostics);
        }

        let mut location: AxisLocation = self
            .source
            .axes()
            .iter()
            .map(|axis| (axis.tag, axis.default))
            .collect();
        for (tag, value) in axes {
            match location.get_mut(&tag) {
                Some(current) => *current = value,
                None => report(&mut diagnostics, Diagnostic::UnknownAxis(tag)),
            }
        }

        let font = self.source.instantiate(&location)?;
        log::debug!("instantiated at {location:?}");
        self.replace_font(font);
        self.axis_locations = location;
        Ok(diagnostics)
    }

    /// Pin the weight axis at the weight class of a static reference font.
    pub fn set_variations_from_static<T: FontSource>(
        &mut self,
        other: &FontModel<T>,
    ) -> Result<Vec<Diagnostic>, Error> {
        if !self.is_variable() {
            let mut diagnostics = Vec::new();
            report(
                &mut diagnostics,
                Diagnostic::UnsupportedOperation("set_variations_from_static"),
            );
            return Ok(diagnostics);
        }
        match other.font.weight_class() {
            Some(weight) => self.set_variations([(WGHT, weight as f32)]),
            None => {
                let mut diagnostics = Vec::new();
                report(&mut diagnostics, Diagnostic::MissingWeightClass);
                Ok(diagnostics)
            }
        }
    }

    /// Rebuild the resolver and every derived table from the current font.
    pub fn recompute_tables(&mut self) {
        (self.resolver, self.tables) = derive(&self.font, self.snapshot);
    }

    fn replace_font(&mut self, font: S) {
        self.font = font;
        self.snapshot = self.snapshot.next();
        self.recompute_tables();
    }

    /// The input for `name` in the current snapshot, unpadded.
    pub fn input_from_name(&mut self, name: &str) -> GlyphInput {
        self.resolver.input_from_name(name, false)
    }

    pub fn glyphset(&self) -> &IndexMap<GlyphName, GlyphInput> {
        &self.tables.glyphset
    }

    pub fn glyph(&self, name: &str) -> Option<&GlyphInput> {
        self.tables.glyphset.get(name)
    }

    /// Declared axis tags in `fvar` order.
    pub fn axis_order(&self) -> &[Tag] {
        &self.axis_order
    }

    /// The pinned location; empty until [`FontModel::set_variations`] succeeds.
    pub fn axis_locations(&self) -> &AxisLocation {
        &self.axis_locations
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    /// The font at its current location.
    pub fn font(&self) -> &S {
        &self.font
    }

    pub fn tables(&self) -> &DerivedTables {
        &self.tables
    }

    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.tables.glyphs
    }

    pub fn names(&self) -> &[NameRecord] {
        &self.tables.names
    }

    pub fn kerns(&self) -> &[KernRecord] {
        &self.tables.kerns
    }

    pub fn marks(&self) -> &[MarkRecord] {
        &self.tables.marks
    }

    pub fn mkmks(&self) -> &[MarkRecord] {
        &self.tables.mkmks
    }

    pub fn metrics(&self) -> &[MetricsRecord] {
        &self.tables.metrics
    }

    pub fn attribs(&self) -> &[Attribute] {
        &self.tables.attribs
    }
}

fn derive<S: FontSource>(font: &S, snapshot: SnapshotId) -> (InputResolver, DerivedTables) {
    let metrics = font.glyph_metrics();
    let mut resolver = InputResolver::with_metrics(font, &metrics, snapshot);
    let tables = DerivedTables::build(font, &metrics, &mut resolver);
    (resolver, tables)
}

fn report(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_helpers::MockFont;

    fn variable_font() -> MockFont {
        MockFont::new()
            .axis(b"wght", 100.0, 400.0, 900.0)
            .glyph("space", ' ', 200)
            .weight_slope("space", 1.0)
            .glyph("acutecomb", '\u{301}', 0)
            .extents("acutecomb", 0, 300)
            .glyph("A", 'A', 600)
            .glyph_without_char("A.sc", 500)
            .rule(&["A"], "A.sc", &[b"smcp"])
    }

    fn static_font() -> MockFont {
        MockFont::new()
            .glyph("space", ' ', 200)
            .glyph("A", 'A', 600)
            .with_weight_class(700)
    }

    #[test]
    fn small_caps_in_the_glyphset() {
        let model = FontModel::new(variable_font());
        let sc = model.glyph("A.sc").unwrap();
        assert_eq!(sc.features, vec![Tag::new(b"smcp")]);
        assert_eq!(sc.text, "A");
        let a = model.glyph("A").unwrap();
        assert!(a.features.is_empty());
        assert_eq!(a.text, "A");
    }

    #[test]
    fn unknown_axis_is_reported_and_skipped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut model = FontModel::new(variable_font());
        let diagnostics = model
            .set_variations([(Tag::new(b"wght"), 700.0), (Tag::new(b"zzzz"), 1.0)])
            .unwrap();
        assert_eq!(diagnostics, vec![Diagnostic::UnknownAxis(Tag::new(b"zzzz"))]);
        assert_eq!(
            model.axis_locations(),
            &AxisLocation::from([(Tag::new(b"wght"), 700.0)])
        );
        assert_eq!(model.axis_order(), &[Tag::new(b"wght")]);
    }

    #[test]
    fn unspecified_axes_take_their_default() {
        let mut model = FontModel::new(variable_font().axis(b"wdth", 75.0, 100.0, 100.0));
        model.set_variations([(Tag::new(b"wdth"), 80.0)]).unwrap();
        assert_eq!(
            model.axis_locations(),
            &AxisLocation::from([(Tag::new(b"wght"), 400.0), (Tag::new(b"wdth"), 80.0)])
        );
    }

    #[test]
    fn static_font_ignores_variations() {
        let mut model = FontModel::new(static_font());
        let before = model.snapshot();
        let diagnostics = model.set_variations([(Tag::new(b"wght"), 700.0)]).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnsupportedOperation("set_variations")]
        );
        assert_eq!(model.snapshot(), before);
        assert!(model.axis_locations().is_empty());
        assert!(model.axis_order().is_empty());
    }

    #[test]
    fn new_location_new_inputs() {
        let mut model = FontModel::new(variable_font());
        let before = model.snapshot();
        // space is 200 wide at the default, acutecomb 300
        assert_eq!(model.glyph("acutecomb").unwrap().text, "  \u{301}");

        model.set_variations([(Tag::new(b"wght"), 700.0)]).unwrap();
        // space is now 500 wide
        let acute = model.glyph("acutecomb").unwrap();
        assert_eq!(acute.text, " \u{301}");
        assert_ne!(model.snapshot(), before);
        assert_eq!(acute.snapshot(), model.snapshot());
        assert!(model
            .glyphset()
            .values()
            .all(|input| input.snapshot() == model.snapshot()));
        assert_eq!(model.tables().snapshot, model.snapshot());
    }

    #[test]
    fn instances_start_from_the_loaded_font() {
        let mut model = FontModel::new(variable_font());
        model.set_variations([(Tag::new(b"wght"), 700.0)]).unwrap();
        model.set_variations([(Tag::new(b"wght"), 400.0)]).unwrap();
        let space = model
            .metrics()
            .iter()
            .find(|m| m.glyph.name.as_str() == "space")
            .unwrap();
        assert_eq!(space.advance, 200);
    }

    #[test]
    fn weight_from_static_reference() {
        let mut model = FontModel::new(variable_font());
        let reference = FontModel::new(static_font());
        let diagnostics = model.set_variations_from_static(&reference).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            model.axis_locations(),
            &AxisLocation::from([(Tag::new(b"wght"), 700.0)])
        );
    }

    #[test]
    fn static_reference_without_weight_class() {
        let mut model = FontModel::new(variable_font());
        let reference = FontModel::new(MockFont::new().glyph("A", 'A', 600));
        let before = model.snapshot();
        let diagnostics = model.set_variations_from_static(&reference).unwrap();
        assert_eq!(diagnostics, vec![Diagnostic::MissingWeightClass]);
        assert_eq!(model.snapshot(), before);
    }

    #[test]
    fn input_from_name_matches_glyphset() {
        let mut model = FontModel::new(variable_font());
        let sc = model.input_from_name("A.sc");
        assert_eq!(Some(&sc), model.glyph("A.sc"));
        assert!(!model.input_from_name("nonexistent").is_resolved());
    }

    #[test]
    fn missing_file() {
        let err = FontModel::load("/definitely/not/here.ttf", None).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
