//! CLI app for comparing two fonts

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use clap::Parser;
use fontdiff::{args::Args, match_variations, write_report, Error, FontDiff};
use fontmodel::FontModel;

fn main() -> Result<(), Error> {
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{}: {style}{}{style:#}: {}",
                ts,
                record.level(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    let mut font_a = FontModel::load(&args.font_a, args.index_a)?;
    let mut font_b = FontModel::load(&args.font_b, args.index_b)?;
    match_variations(&mut font_a, &mut font_b, &args.vf_instance)?;

    let diff = FontDiff::new(&font_a, &font_b, &args.diff_options());

    let mut write_target: Box<dyn Write> = match args.out.as_ref() {
        Some(path) => File::create(path)
            .map_err(|inner| Error::FileWrite {
                path: path.to_owned(),
                inner,
            })
            .map(|f| Box::new(BufWriter::new(f)))?,
        None => Box::new(std::io::stdout()),
    };

    if args.json {
        serde_json::to_writer_pretty(&mut write_target, &diff)?;
        writeln!(&mut write_target)?;
    } else {
        write_report(
            &mut write_target,
            &file_name(&args.font_a),
            &file_name(&args.font_b),
            &diff,
            args.output_lines,
        )?;
    }
    write_target.flush()?;

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
