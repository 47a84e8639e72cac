use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::cli::CellArgs;
use crate::util::write_json_stdout;
use crate::value::ValueParser;

#[derive(Debug, Serialize)]
struct CellReport<'a> {
    raw: &'a str,
    kind: &'static str,
    canonical: String,
    reasons: Vec<String>,
    rendered: String,
}

pub fn run(args: CellArgs) -> Result<()> {
    let parser = ValueParser::new()?;
    let parsed = parser.parse(&args.raw);

    let report = CellReport {
        raw: &args.raw,
        kind: parsed.kind(),
        canonical: parsed.to_canonical_json(),
        reasons: parser.reasons(&args.raw),
        rendered: parser.render(&args.raw),
    };

    if args.json {
        return write_json_stdout(&report);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Kind: {}", report.kind)?;
    writeln!(output, "Canonical: {}", report.canonical)?;
    writeln!(output, "Reasons: {}", report.reasons.join(", "))?;
    writeln!(output, "Rendered:")?;
    for line in report.rendered.lines() {
        writeln!(output, "\t{line}")?;
    }
    output.flush()?;
    Ok(())
}
