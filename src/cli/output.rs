//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::core::report;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print rows as a table with a header line
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::sharp());
    println!("{}", table);
}

/// Print a single serializable value as JSON or YAML
pub fn print_value<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print a list in the requested format
///
/// `ids` is used for `--format id`, `cells` for table output; everything else
/// serializes `records` directly.
pub fn print_list<T: Serialize>(
    format: OutputFormat,
    records: &[T],
    headers: &[&str],
    cells: impl Fn(&T) -> Vec<String>,
    ids: impl Fn(&T) -> String,
) -> Result<()> {
    match effective_format(format, true) {
        OutputFormat::Json => {
            report::write_json(std::io::stdout().lock(), records).into_diagnostic()?
        }
        OutputFormat::Yaml => print_value(OutputFormat::Yaml, &records)?,
        OutputFormat::Csv => report::write_csv(std::io::stdout().lock(), records).into_diagnostic()?,
        OutputFormat::Id => {
            for record in records {
                println!("{}", ids(record));
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            print_table(headers, records.iter().map(cells).collect());
        }
    }
    Ok(())
}
