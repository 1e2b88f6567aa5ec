use std::{fmt::Display, path::PathBuf};

use write_fonts::{read::ReadError, types::Tag};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read path '{path}': '{inner}'")]
    Load {
        path: PathBuf,
        inner: std::io::Error,
    },
    #[error("could not read font data: '{0}")]
    FontRead(#[from] ReadError),
    #[error("missing table '{0}'")]
    MissingTable(Tag),
}

/// A non-fatal problem reported while changing a font's state.
///
/// These never interrupt the operation that produced them; they are logged
/// and handed back to the caller for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A variation was requested on a font without an `fvar` table.
    UnsupportedOperation(&'static str),
    /// A requested axis is not declared by the font; the tag was ignored.
    UnknownAxis(Tag),
    /// A static font offered as a reference has no weight class.
    MissingWeightClass,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnsupportedOperation(what) => {
                write!(f, "{what} is not supported: font is not variable")
            }
            Diagnostic::UnknownAxis(tag) => write!(f, "font has no axis called '{tag}'"),
            Diagnostic::MissingWeightClass => {
                f.write_str("reference font has no OS/2 weight class")
            }
        }
    }
}
