//! Comparing the derived tables of two fonts
//!
//! Every category is compared the same way: records are keyed, records whose
//! key appears on one side only are new or missing, and records present on
//! both sides are checked for a change larger than the category's threshold.

use std::{collections::BTreeSet, hash::Hash};

use fontmodel::{
    Attribute, FontModel, FontSource, GlyphInput, GlyphName, GlyphRecord, KernRecord,
    MarkRecord, MetricsRecord, NameRecord,
};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use write_fonts::types::Tag;

use crate::args::Category;

/// What to compare, and how large a change must be to be reported.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffOptions {
    pub categories: BTreeSet<Category>,
    pub marks_thresh: i32,
    pub mkmks_thresh: i32,
    pub kerns_thresh: i32,
    pub metrics_thresh: i32,
    /// Relative change in outline area.
    pub glyphs_thresh: f64,
    pub attribs_thresh: f64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            categories: Category::ALL.into_iter().collect(),
            marks_thresh: 0,
            mkmks_thresh: 0,
            kerns_thresh: 0,
            metrics_thresh: 0,
            glyphs_thresh: 0.0,
            attribs_thresh: 0.0,
        }
    }
}

/// The result of comparing one category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Changes<T, M> {
    /// In the second font only.
    pub new: Vec<T>,
    /// In the first font only.
    pub missing: Vec<T>,
    /// In both, with a difference above the threshold; largest first.
    pub modified: Vec<M>,
}

impl<T, M> Changes<T, M> {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.missing.is_empty() && self.modified.is_empty()
    }

    fn largest_first(mut self, magnitude: impl Fn(&T) -> f64) -> Self {
        self.new
            .sort_by(|a, b| magnitude(b).total_cmp(&magnitude(a)));
        self.missing
            .sort_by(|a, b| magnitude(b).total_cmp(&magnitude(a)));
        self
    }

    fn ordered_by<K: Ord>(mut self, key: impl Fn(&T) -> K) -> Self {
        self.new.sort_by_key(|item| key(item));
        self.missing.sort_by_key(|item| key(item));
        self
    }
}

/// Size of a modification, used for ordering.
pub trait Magnitude {
    fn magnitude(&self) -> f64;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NameChange {
    pub name_id: u16,
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub string_a: String,
    pub string_b: String,
}

impl Magnitude for NameChange {
    fn magnitude(&self) -> f64 {
        0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttribChange {
    pub table: Tag,
    pub name: &'static str,
    pub value_a: f64,
    pub value_b: f64,
}

impl AttribChange {
    pub fn diff(&self) -> f64 {
        self.value_b - self.value_a
    }
}

impl Magnitude for AttribChange {
    fn magnitude(&self) -> f64 {
        self.diff().abs()
    }
}

/// Side bearing and advance changes, second font minus first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsChange {
    pub glyph: GlyphInput,
    pub diff_advance: i32,
    pub diff_lsb: i32,
    pub diff_rsb: i32,
}

impl Magnitude for MetricsChange {
    fn magnitude(&self) -> f64 {
        [self.diff_advance, self.diff_lsb, self.diff_rsb]
            .into_iter()
            .map(i32::abs)
            .max()
            .unwrap_or_default() as f64
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlyphChange {
    pub glyph: GlyphInput,
    /// `|a - b| / max(|a|, |b|)` of the two outline areas.
    pub diff: f64,
}

impl Magnitude for GlyphChange {
    fn magnitude(&self) -> f64 {
        self.diff
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KernChange {
    pub left: GlyphInput,
    pub right: GlyphInput,
    pub value_a: i32,
    pub value_b: i32,
}

impl KernChange {
    pub fn diff(&self) -> i32 {
        self.value_b - self.value_a
    }
}

impl Magnitude for KernChange {
    fn magnitude(&self) -> f64 {
        self.diff().abs() as f64
    }
}

/// A change in where a mark lands relative to its base.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkChange {
    pub base: GlyphInput,
    pub mark: GlyphInput,
    pub diff_x: i32,
    pub diff_y: i32,
}

impl Magnitude for MarkChange {
    fn magnitude(&self) -> f64 {
        self.diff_x.abs().max(self.diff_y.abs()) as f64
    }
}

/// The comparison of two fonts; categories that were not requested are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FontDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Changes<NameRecord, NameChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<Changes<MarkRecord, MarkChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mkmks: Option<Changes<MarkRecord, MarkChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribs: Option<Changes<Attribute, AttribChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Changes<MetricsRecord, MetricsChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyphs: Option<Changes<GlyphRecord, GlyphChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kerns: Option<Changes<KernRecord, KernChange>>,
}

impl FontDiff {
    pub fn new<A: FontSource, B: FontSource>(
        font_a: &FontModel<A>,
        font_b: &FontModel<B>,
        options: &DiffOptions,
    ) -> Self {
        let wanted = |category| options.categories.contains(&category);
        let mut diff = FontDiff::default();
        if wanted(Category::Names) {
            diff.names = Some(diff_names(font_a.names(), font_b.names()));
        }
        if wanted(Category::Marks) {
            diff.marks = Some(diff_marks(
                font_a.marks(),
                font_b.marks(),
                options.marks_thresh,
            ));
        }
        if wanted(Category::Mkmks) {
            diff.mkmks = Some(diff_marks(
                font_a.mkmks(),
                font_b.mkmks(),
                options.mkmks_thresh,
            ));
        }
        if wanted(Category::Attribs) {
            diff.attribs = Some(diff_attribs(
                font_a.attribs(),
                font_b.attribs(),
                options.attribs_thresh,
            ));
        }
        if wanted(Category::Metrics) {
            diff.metrics = Some(diff_metrics(
                font_a.metrics(),
                font_b.metrics(),
                options.metrics_thresh,
            ));
        }
        if wanted(Category::Glyphs) {
            diff.glyphs = Some(diff_glyphs(
                font_a.glyphs(),
                font_b.glyphs(),
                options.glyphs_thresh,
            ));
        }
        if wanted(Category::Kerns) {
            diff.kerns = Some(diff_kerns(
                font_a.kerns(),
                font_b.kerns(),
                options.kerns_thresh,
            ));
        }
        log::debug!("compared {:?}", options.categories);
        diff
    }

    /// True if no requested category found a difference.
    pub fn is_empty(&self) -> bool {
        self.names.as_ref().map_or(true, Changes::is_empty)
            && self.marks.as_ref().map_or(true, Changes::is_empty)
            && self.mkmks.as_ref().map_or(true, Changes::is_empty)
            && self.attribs.as_ref().map_or(true, Changes::is_empty)
            && self.metrics.as_ref().map_or(true, Changes::is_empty)
            && self.glyphs.as_ref().map_or(true, Changes::is_empty)
            && self.kerns.as_ref().map_or(true, Changes::is_empty)
    }
}

/// How a glyph is recognized in the other font.
///
/// Glyphs with an input are matched by what it takes to shape them; glyphs
/// no input reaches can only be matched by name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum GlyphKey {
    Input(String),
    Name(GlyphName),
}

impl From<&GlyphInput> for GlyphKey {
    fn from(glyph: &GlyphInput) -> Self {
        if glyph.is_resolved() {
            GlyphKey::Input(glyph.key())
        } else {
            GlyphKey::Name(glyph.name.clone())
        }
    }
}

/// Items of `a` whose key does not occur in `b`, in `a`'s order.
fn subtract<T: Clone, K: Eq + Hash>(a: &[T], b: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let in_b: IndexSet<K> = b.iter().map(&key).collect();
    a.iter()
        .filter(|item| !in_b.contains(&key(*item)))
        .cloned()
        .collect()
}

/// `change` applied to every pair of items sharing a key, largest first.
///
/// If a key occurs more than once on one side, the first occurrence is used.
fn modified<T, K: Eq + Hash, M: Magnitude>(
    a: &[T],
    b: &[T],
    key: impl Fn(&T) -> K,
    change: impl Fn(&T, &T) -> Option<M>,
) -> Vec<M> {
    let in_b = first_by_key(b, &key);
    let mut changes: Vec<_> = first_by_key(a, &key)
        .into_iter()
        .filter_map(|(k, item_a)| change(item_a, *in_b.get(&k)?))
        .collect();
    changes.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));
    changes
}

fn first_by_key<'a, T, K: Eq + Hash>(items: &'a [T], key: impl Fn(&T) -> K) -> IndexMap<K, &'a T> {
    let mut by_key = IndexMap::with_capacity(items.len());
    for item in items {
        by_key.entry(key(item)).or_insert(item);
    }
    by_key
}

fn compare<T: Clone, K: Eq + Hash, M: Magnitude>(
    a: &[T],
    b: &[T],
    key: impl Fn(&T) -> K,
    change: impl Fn(&T, &T) -> Option<M>,
) -> Changes<T, M> {
    Changes {
        new: subtract(b, a, &key),
        missing: subtract(a, b, &key),
        modified: modified(a, b, &key, change),
    }
}

fn diff_names(a: &[NameRecord], b: &[NameRecord]) -> Changes<NameRecord, NameChange> {
    let key = |name: &NameRecord| {
        (
            name.name_id,
            name.platform_id,
            name.encoding_id,
            name.language_id,
        )
    };
    compare(a, b, key, |a, b| {
        (a.string != b.string).then(|| NameChange {
            name_id: a.name_id,
            platform_id: a.platform_id,
            encoding_id: a.encoding_id,
            language_id: a.language_id,
            string_a: a.string.clone(),
            string_b: b.string.clone(),
        })
    })
    .ordered_by(key)
}

fn diff_attribs(a: &[Attribute], b: &[Attribute], threshold: f64) -> Changes<Attribute, AttribChange> {
    compare(
        a,
        b,
        |attrib| (attrib.table, attrib.name),
        |a, b| {
            let change = AttribChange {
                table: a.table,
                name: a.name,
                value_a: a.value,
                value_b: b.value,
            };
            (change.magnitude() > threshold).then_some(change)
        },
    )
    .largest_first(|attrib| attrib.value.abs())
}

fn diff_metrics(
    a: &[MetricsRecord],
    b: &[MetricsRecord],
    threshold: i32,
) -> Changes<MetricsRecord, MetricsChange> {
    compare(
        a,
        b,
        |metrics| metrics.glyph.name.clone(),
        |a, b| {
            let change = MetricsChange {
                glyph: b.glyph.clone(),
                diff_advance: b.advance - a.advance,
                diff_lsb: b.lsb - a.lsb,
                diff_rsb: b.rsb - a.rsb,
            };
            (change.magnitude() > threshold as f64).then_some(change)
        },
    )
    .largest_first(|metrics| metrics.advance.abs() as f64)
}

fn diff_glyphs(
    a: &[GlyphRecord],
    b: &[GlyphRecord],
    threshold: f64,
) -> Changes<GlyphRecord, GlyphChange> {
    compare(
        a,
        b,
        |glyph| glyph.glyph.name.clone(),
        |a, b| {
            let diff = relative_difference(a.area, b.area);
            (diff > threshold).then(|| GlyphChange {
                glyph: b.glyph.clone(),
                diff,
            })
        },
    )
    .largest_first(|glyph| glyph.area.abs())
}

fn relative_difference(a: f64, b: f64) -> f64 {
    let largest = a.abs().max(b.abs());
    if largest == 0.0 {
        return 0.0;
    }
    (a - b).abs() / largest
}

fn diff_kerns(a: &[KernRecord], b: &[KernRecord], threshold: i32) -> Changes<KernRecord, KernChange> {
    compare(
        a,
        b,
        |kern| (GlyphKey::from(&kern.left), GlyphKey::from(&kern.right)),
        |a, b| {
            let change = KernChange {
                left: b.left.clone(),
                right: b.right.clone(),
                value_a: a.value,
                value_b: b.value,
            };
            (change.diff().abs() > threshold).then_some(change)
        },
    )
    .largest_first(|kern| kern.value.abs() as f64)
}

fn diff_marks(a: &[MarkRecord], b: &[MarkRecord], threshold: i32) -> Changes<MarkRecord, MarkChange> {
    let key = |mark: &MarkRecord| (GlyphKey::from(&mark.base), GlyphKey::from(&mark.mark));
    compare(a, b, key, |a, b| {
        let (ax, ay) = mark_offset(a);
        let (bx, by) = mark_offset(b);
        let change = MarkChange {
            base: b.base.clone(),
            mark: b.mark.clone(),
            diff_x: bx - ax,
            diff_y: by - ay,
        };
        (change.diff_x.abs() > threshold || change.diff_y.abs() > threshold).then_some(change)
    })
    .ordered_by(key)
}

/// Where the mark's origin ends up relative to the base's origin.
fn mark_offset(record: &MarkRecord) -> (i32, i32) {
    (
        record.base_anchor.x - record.mark_anchor.x,
        record.base_anchor.y - record.mark_anchor.y,
    )
}
