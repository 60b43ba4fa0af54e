//! Flat CSV projection of a row set.

use std::io::Write;

use ledger_model::{Row, TeamRoster, TextField};

use crate::error::Result;

/// Narrow no-break space, the French thousands separator.
pub const NARROW_NBSP: char = '\u{202F}';

/// Options for CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExportOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Inserted between groups of three digits; `None` disables grouping.
    pub thousands_separator: Option<char>,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            thousands_separator: Some(NARROW_NBSP),
        }
    }
}

/// Formats `value` with `separator` between groups of three digits.
pub fn group_thousands(value: u64, separator: Option<char>) -> String {
    let digits = value.to_string();
    let Some(separator) = separator else {
        return digits;
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len_utf8());
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(digit);
    }
    out
}

/// Header row: `id`, text fields in schema order, one column per team, `total`.
pub fn export_header(roster: &TeamRoster) -> Vec<String> {
    let mut header = Vec::with_capacity(TextField::ALL.len() + roster.len() + 2);
    header.push("id".to_string());
    header.extend(TextField::ALL.iter().map(|field| field.key().to_string()));
    header.extend((0..roster.len()).map(|slot| roster.name(slot)));
    header.push("total".to_string());
    header
}

/// Writes one CSV record per row, after a header record.
///
/// Contribution slots beyond the roster are not exported; the total still
/// counts every slot.
pub fn export_csv<R, W>(
    rows: &[R],
    roster: &TeamRoster,
    writer: W,
    options: &CsvExportOptions,
) -> Result<()>
where
    R: AsRef<Row>,
    W: Write,
{
    let mut csv = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    csv.write_record(export_header(roster))?;

    let grouped = |value: u64| group_thousands(value, options.thousands_separator);
    for row in rows {
        let row = row.as_ref();
        let mut record = Vec::with_capacity(TextField::ALL.len() + roster.len() + 2);
        record.push(row.id.to_string());
        record.extend(TextField::ALL.iter().map(|field| row.text(*field).to_string()));
        record.extend((0..roster.len()).map(|slot| grouped(row.slot(slot))));
        record.push(grouped(row.total()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    tracing::debug!(rows = rows.len(), "exported rows as CSV");
    Ok(())
}
