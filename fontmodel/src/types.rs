//! Basic types shared by the resolver, the model and the derived tables.

use std::fmt::{Debug, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use write_fonts::types::Tag;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlyphName(SmolStr);

impl GlyphName {
    /// The name of the undefined glyph
    pub const NOTDEF: GlyphName = GlyphName(SmolStr::new_inline(".notdef"));

    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for GlyphName {
    fn from(value: String) -> Self {
        GlyphName(value.into())
    }
}

impl From<&str> for GlyphName {
    fn from(value: &str) -> Self {
        GlyphName(value.into())
    }
}

impl From<SmolStr> for GlyphName {
    fn from(value: SmolStr) -> Self {
        GlyphName(value)
    }
}

impl Debug for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for GlyphName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// this means if you have a HashMap<GlyphName, _> you can use &str to
// look up an item
impl std::borrow::Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

/// Identifies one font resource held by a [`FontModel`](crate::FontModel).
///
/// A new id is issued every time the resource is replaced; anything derived
/// from a resource remembers the id it was derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub(crate) fn next(self) -> SnapshotId {
        SnapshotId(self.0 + 1)
    }
}

/// A variation axis declared in `fvar`, in user space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AxisInfo {
    pub tag: Tag,
    pub min: f32,
    pub default: f32,
    pub max: f32,
}

/// A user-space coordinate: axis tag to value.
///
/// Order is preserved, so a location built from a font's axes lists them in
/// `fvar` order.
pub type AxisLocation = IndexMap<Tag, f32>;
