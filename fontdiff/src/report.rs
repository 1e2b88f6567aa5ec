//! Plain text rendering of a [`FontDiff`]

use std::{borrow::Cow, io::Write};

use fontmodel::{Attribute, GlyphRecord, KernRecord, MarkRecord, MetricsRecord, NameRecord};

use crate::{
    args::Category,
    diff::{
        AttribChange, Changes, FontDiff, GlyphChange, KernChange, MarkChange, MetricsChange,
        NameChange,
    },
};

const COLUMN_WIDTH: usize = 20;

/// Something that can be printed as one row of a table.
trait Row {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

/// Write a report of `diff`, at most `output_lines` rows per table.
pub fn write_report(
    out: &mut impl Write,
    name_a: &str,
    name_b: &str,
    diff: &FontDiff,
    output_lines: usize,
) -> std::io::Result<()> {
    writeln!(out, "{name_a} vs {name_b}")?;
    if let Some(names) = &diff.names {
        write_category(out, Category::Names, names, output_lines)?;
    }
    if let Some(marks) = &diff.marks {
        write_category(out, Category::Marks, marks, output_lines)?;
    }
    if let Some(mkmks) = &diff.mkmks {
        write_category(out, Category::Mkmks, mkmks, output_lines)?;
    }
    if let Some(attribs) = &diff.attribs {
        write_category(out, Category::Attribs, attribs, output_lines)?;
    }
    if let Some(metrics) = &diff.metrics {
        write_category(out, Category::Metrics, metrics, output_lines)?;
    }
    if let Some(glyphs) = &diff.glyphs {
        write_category(out, Category::Glyphs, glyphs, output_lines)?;
    }
    if let Some(kerns) = &diff.kerns {
        write_category(out, Category::Kerns, kerns, output_lines)?;
    }
    Ok(())
}

fn write_category<T: Row, M: Row>(
    out: &mut impl Write,
    category: Category,
    changes: &Changes<T, M>,
    output_lines: usize,
) -> std::io::Result<()> {
    write_table(out, category, "new", &changes.new, output_lines)?;
    write_table(out, category, "missing", &changes.missing, output_lines)?;
    write_table(out, category, "modified", &changes.modified, output_lines)
}

fn write_table<R: Row>(
    out: &mut impl Write,
    category: Category,
    sub_category: &str,
    rows: &[R],
    output_lines: usize,
) -> std::io::Result<()> {
    writeln!(out)?;
    if rows.is_empty() {
        writeln!(out, "***{category} {sub_category}***")?;
        return writeln!(out, "No differences");
    }
    writeln!(out, "***{category} {} {sub_category}***", rows.len())?;
    write_row(out, R::COLUMNS.iter().map(|column| column.to_string()))?;
    for row in rows.iter().take(output_lines) {
        write_row(out, row.cells())?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, cells: impl IntoIterator<Item = String>) -> std::io::Result<()> {
    let mut line = String::new();
    for cell in cells {
        line.push_str(&format!("{:<COLUMN_WIDTH$}", clip(&cell)));
    }
    writeln!(out, "{}", line.trim_end())
}

fn clip(cell: &str) -> Cow<str> {
    if cell.chars().count() < COLUMN_WIDTH - 1 {
        return Cow::Borrowed(cell);
    }
    let mut clipped: String = cell.chars().take(COLUMN_WIDTH - 4).collect();
    clipped.push_str("...");
    Cow::Owned(clipped)
}

fn name_id(name_id: u16, platform_id: u16, encoding_id: u16, language_id: u16) -> String {
    format!("({name_id}, {platform_id}, {encoding_id}, {language_id})")
}

impl Row for NameRecord {
    const COLUMNS: &'static [&'static str] = &["id", "string"];

    fn cells(&self) -> Vec<String> {
        vec![
            name_id(
                self.name_id,
                self.platform_id,
                self.encoding_id,
                self.language_id,
            ),
            self.string.clone(),
        ]
    }
}

impl Row for NameChange {
    const COLUMNS: &'static [&'static str] = &["id", "string_a", "string_b"];

    fn cells(&self) -> Vec<String> {
        vec![
            name_id(
                self.name_id,
                self.platform_id,
                self.encoding_id,
                self.language_id,
            ),
            self.string_a.clone(),
            self.string_b.clone(),
        ]
    }
}

impl Row for MarkRecord {
    const COLUMNS: &'static [&'static str] = &[
        "base_glyph",
        "mark_glyph",
        "base_x",
        "base_y",
        "mark_x",
        "mark_y",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.base.name.to_string(),
            self.mark.name.to_string(),
            self.base_anchor.x.to_string(),
            self.base_anchor.y.to_string(),
            self.mark_anchor.x.to_string(),
            self.mark_anchor.y.to_string(),
        ]
    }
}

impl Row for MarkChange {
    const COLUMNS: &'static [&'static str] = &["base_glyph", "mark_glyph", "diff_x", "diff_y"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.base.name.to_string(),
            self.mark.name.to_string(),
            self.diff_x.to_string(),
            self.diff_y.to_string(),
        ]
    }
}

impl Row for Attribute {
    const COLUMNS: &'static [&'static str] = &["table", "attrib", "value"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.table.to_string(),
            self.name.to_string(),
            self.value.to_string(),
        ]
    }
}

impl Row for AttribChange {
    const COLUMNS: &'static [&'static str] = &["table", "attrib", "value_a", "value_b"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.table.to_string(),
            self.name.to_string(),
            self.value_a.to_string(),
            self.value_b.to_string(),
        ]
    }
}

impl Row for MetricsRecord {
    const COLUMNS: &'static [&'static str] = &["glyph", "adv", "lsb", "rsb"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.glyph.name.to_string(),
            self.advance.to_string(),
            self.lsb.to_string(),
            self.rsb.to_string(),
        ]
    }
}

impl Row for MetricsChange {
    const COLUMNS: &'static [&'static str] = &["glyph", "diff_adv", "diff_lsb", "diff_rsb"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.glyph.name.to_string(),
            self.diff_advance.to_string(),
            self.diff_lsb.to_string(),
            self.diff_rsb.to_string(),
        ]
    }
}

impl Row for GlyphRecord {
    const COLUMNS: &'static [&'static str] = &["glyph"];

    fn cells(&self) -> Vec<String> {
        vec![self.glyph.name.to_string()]
    }
}

impl Row for GlyphChange {
    const COLUMNS: &'static [&'static str] = &["glyph", "diff"];

    fn cells(&self) -> Vec<String> {
        vec![self.glyph.name.to_string(), format!("{:.3}", self.diff)]
    }
}

impl Row for KernRecord {
    const COLUMNS: &'static [&'static str] = &["left", "right", "value"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.left.name.to_string(),
            self.right.name.to_string(),
            self.value.to_string(),
        ]
    }
}

impl Row for KernChange {
    const COLUMNS: &'static [&'static str] = &["left", "right", "diff"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.left.name.to_string(),
            self.right.name.to_string(),
            self.diff().to_string(),
        ]
    }
}
