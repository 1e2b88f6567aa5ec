use std::{collections::BTreeSet, fmt::Display, path::PathBuf, str::FromStr};

use serde::Serialize;
use write_fonts::types::Tag;

use crate::{diff::DiffOptions, error::Error};

#[derive(Clone, Debug, clap::Parser)]
#[command(about = "Compare the glyphs, layout and header tables of two fonts")]
pub struct Args {
    pub font_a: PathBuf,
    pub font_b: PathBuf,
    /// Index of the font to examine if `font_a` is a collection
    #[arg(long)]
    pub index_a: Option<u32>,
    /// Index of the font to examine if `font_b` is a collection
    #[arg(long)]
    pub index_b: Option<u32>,
    /// Categories to compare, any of names/marks/mkmks/attribs/metrics/glyphs/kerns.
    /// Default is all of them.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub to_diff: Vec<Category>,
    /// Location to compare at when both fonts are variable
    #[arg(long, default_value_t)]
    pub vf_instance: Instance,
    #[arg(long, default_value_t = 0)]
    pub marks_thresh: i32,
    #[arg(long, default_value_t = 0)]
    pub mkmks_thresh: i32,
    #[arg(long, default_value_t = 0)]
    pub kerns_thresh: i32,
    #[arg(long, default_value_t = 0)]
    pub metrics_thresh: i32,
    /// Relative change in outline area, 0.0 to 1.0
    #[arg(long, default_value_t = 0.0)]
    pub glyphs_thresh: f64,
    #[arg(long, default_value_t = 0.0)]
    pub attribs_thresh: f64,
    /// Maximum number of rows printed for each table
    #[arg(long, default_value_t = 50)]
    pub output_lines: usize,
    /// Print the complete diff as json instead of the text report
    #[arg(long)]
    pub json: bool,
    /// Optional destination path for writing output. Default is stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl Args {
    pub fn diff_options(&self) -> DiffOptions {
        let categories = if self.to_diff.is_empty() {
            Category::ALL.into_iter().collect()
        } else {
            self.to_diff.iter().copied().collect::<BTreeSet<_>>()
        };
        DiffOptions {
            categories,
            marks_thresh: self.marks_thresh,
            mkmks_thresh: self.mkmks_thresh,
            kerns_thresh: self.kerns_thresh,
            metrics_thresh: self.metrics_thresh,
            glyphs_thresh: self.glyphs_thresh,
            attribs_thresh: self.attribs_thresh,
        }
    }
}

/// One kind of table that can be compared
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Names,
    Marks,
    Mkmks,
    Attribs,
    Metrics,
    Glyphs,
    Kerns,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 7] = [
        Category::Names,
        Category::Marks,
        Category::Mkmks,
        Category::Attribs,
        Category::Metrics,
        Category::Glyphs,
        Category::Kerns,
    ];
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Category::Names => f.write_str("names"),
            Category::Marks => f.write_str("marks"),
            Category::Mkmks => f.write_str("mkmks"),
            Category::Attribs => f.write_str("attribs"),
            Category::Metrics => f.write_str("metrics"),
            Category::Glyphs => f.write_str("glyphs"),
            Category::Kerns => f.write_str("kerns"),
        }
    }
}

impl FromStr for Category {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static ERR_MSG: &str =
            "expected one of 'names', 'marks', 'mkmks', 'attribs', 'metrics', 'glyphs', 'kerns'";
        match s.to_ascii_lowercase().trim() {
            "names" => Ok(Self::Names),
            "marks" => Ok(Self::Marks),
            "mkmks" => Ok(Self::Mkmks),
            "attribs" => Ok(Self::Attribs),
            "metrics" => Ok(Self::Metrics),
            "glyphs" => Ok(Self::Glyphs),
            "kerns" => Ok(Self::Kerns),
            _ => Err(ERR_MSG),
        }
    }
}

/// A user-space location, written `wght=400, wdth=100`
#[derive(Clone, Debug, PartialEq)]
pub struct Instance(pub Vec<(Tag, f32)>);

impl Default for Instance {
    fn default() -> Self {
        Instance(vec![(Tag::new(b"wght"), 400.0)])
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, (tag, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for Instance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::BadInstance(s.to_string());
        s.split(',')
            .map(str::trim)
            .filter(|setting| !setting.is_empty())
            .map(|setting| {
                let (tag, value) = setting.split_once('=').ok_or_else(bad)?;
                let tag = tag.trim().parse::<Tag>().map_err(|_| bad())?;
                let value = value.trim().parse::<f32>().map_err(|_| bad())?;
                Ok((tag, value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Instance)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("wght=400", vec![(Tag::new(b"wght"), 400.0)])]
    #[case("wght=700, wdth=87.5", vec![(Tag::new(b"wght"), 700.0), (Tag::new(b"wdth"), 87.5)])]
    #[case(" opsz = 12 ,", vec![(Tag::new(b"opsz"), 12.0)])]
    #[case("", vec![])]
    fn parse_instance(#[case] input: &str, #[case] expected: Vec<(Tag, f32)>) {
        assert_eq!(input.parse::<Instance>().unwrap(), Instance(expected));
    }

    #[rstest]
    #[case("wght")]
    #[case("wght=bold")]
    #[case("toolong=400")]
    fn bad_instance(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Instance>(),
            Err(Error::BadInstance(_))
        ));
    }

    #[test]
    fn instance_display_parses_back() {
        let instance = Instance::default();
        assert_eq!(instance.to_string(), "wght=400");
        assert_eq!(instance.to_string().parse::<Instance>().unwrap(), instance);
    }

    #[test]
    fn all_categories_by_default() {
        let args = Args::parse_from(["fontdiff", "a.ttf", "b.ttf"]);
        let options = args.diff_options();
        assert_eq!(options.categories.len(), Category::ALL.len());
        assert_eq!(args.vf_instance, Instance::default());
        assert_eq!(args.output_lines, 50);
    }

    #[test]
    fn some_categories() {
        let args = Args::parse_from([
            "fontdiff",
            "a.ttf",
            "b.ttf",
            "--to-diff",
            "kerns,Marks",
            "--kerns-thresh",
            "15",
        ]);
        let options = args.diff_options();
        assert_eq!(
            options.categories.into_iter().collect::<Vec<_>>(),
            [Category::Marks, Category::Kerns]
        );
        assert_eq!(options.kerns_thresh, 15);
    }
}
