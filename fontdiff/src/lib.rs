//! Structural comparison of two fonts
//!
//! Both fonts are brought to a comparable location, then the tables each
//! [`FontModel`] derives are compared category by category.

pub mod args;
mod diff;
mod error;
mod report;

use fontmodel::{Diagnostic, FontModel, FontSource};

pub use diff::{
    AttribChange, Changes, DiffOptions, FontDiff, GlyphChange, KernChange, Magnitude, MarkChange,
    MetricsChange, NameChange,
};
pub use error::Error;
pub use report::write_report;

use args::Instance;

/// Pin variable fonts so that both are compared at the same design.
///
/// A variable font compared against a static one takes the static font's
/// weight; two variable fonts are both pinned at `instance`. Two static fonts
/// are left alone.
pub fn match_variations<A: FontSource, B: FontSource>(
    font_a: &mut FontModel<A>,
    font_b: &mut FontModel<B>,
    instance: &Instance,
) -> Result<Vec<Diagnostic>, Error> {
    let diagnostics = match (font_a.is_variable(), font_b.is_variable()) {
        (true, false) => font_a.set_variations_from_static(font_b)?,
        (false, true) => font_b.set_variations_from_static(font_a)?,
        (true, true) => {
            let mut diagnostics = font_a.set_variations(instance.0.iter().copied())?;
            diagnostics.extend(font_b.set_variations(instance.0.iter().copied())?);
            diagnostics
        }
        (false, false) => Vec::new(),
    };
    Ok(diagnostics)
}
