//! Terminal tables for rows, audit entries and purge reports.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use ledger_core::LoadOrigin;
use ledger_model::{AggregatedRow, AuditEntry, Row, TeamRoster};
use ledger_query::{Aggregation, Page, group_thousands};
use ledger_store::PurgeReport;

/// Prints one page of rows with a contribution column per team.
pub fn print_rows<R>(title: &str, page: &Page<'_, R>, roster: &TeamRoster, separator: Option<char>)
where
    R: AsRef<Row>,
{
    let mut table = Table::new();
    let mut header = vec![
        header_cell("Id"),
        header_cell("Thématique"),
        header_cell("Nature"),
        header_cell("Origine"),
    ];
    header.extend((0..roster.len()).map(|slot| header_cell(&roster.name(slot))));
    header.push(header_cell("Total"));
    header.push(header_cell("Comments"));
    table.set_header(header);
    apply_table_style(&mut table);
    for column in (4..5 + roster.len()).chain([0]) {
        align_column(&mut table, column, CellAlignment::Right);
    }

    for item in &page.items {
        let row = item.as_ref();
        let mut cells = vec![
            dim_cell(row.id),
            Cell::new(&row.thematique).add_attribute(Attribute::Bold),
            text_cell(&row.nature),
            text_cell(&row.origine),
        ];
        cells.extend((0..roster.len()).map(|slot| count_cell(row.slot(slot), separator)));
        cells.push(
            Cell::new(group_thousands(row.total(), separator)).add_attribute(Attribute::Bold),
        );
        cells.push(dim_cell(row.comments.len()));
        table.add_row(cells);
    }

    println!("{title}");
    println!("{table}");
    println!(
        "Page {}/{} ({} matching rows)",
        page.page,
        page.total_pages.max(1),
        page.filtered
    );
}

/// Prints the consolidated view, then any skipped sources.
pub fn print_aggregation(
    aggregation: &Aggregation,
    page: &Page<'_, AggregatedRow>,
    roster: &TeamRoster,
    separator: Option<char>,
) {
    print_rows("Consolidated view", page, roster, separator);
    let mut sources = Table::new();
    sources.set_header(vec![header_cell("Thématique"), header_cell("Sources")]);
    apply_table_style(&mut sources);
    for item in &page.items {
        let keys: Vec<&str> = item.sources.iter().map(|key| key.as_str()).collect();
        sources.add_row(vec![Cell::new(item.key()), dim_cell(keys.join(", "))]);
    }
    println!("{sources}");

    for failure in &aggregation.failures {
        eprintln!("warning: {}", failure.error.user_message());
    }
}

pub fn print_audit(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("When"),
        header_cell("User"),
        header_cell("Row"),
        header_cell("Field"),
        header_cell("Old"),
        header_cell("New"),
    ]);
    apply_table_style(&mut table);
    for entry in entries {
        table.add_row(vec![
            dim_cell(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.user).fg(Color::Cyan),
            Cell::new(format!("{} {}", entry.change.row_id, entry.change.row_label)),
            Cell::new(&entry.change.field),
            Cell::new(&entry.change.old_value).fg(Color::Red),
            Cell::new(&entry.change.new_value).fg(Color::Green),
        ]);
    }
    println!("{table}");
}

pub fn print_origin(table: &str, origin: LoadOrigin, rows: usize) {
    match origin {
        LoadOrigin::Stored => println!("{table} already exists ({rows} rows), left unchanged."),
        LoadOrigin::Fallback { written_back: true } => {
            println!("{table} created with {rows} rows.");
        }
        LoadOrigin::Fallback {
            written_back: false,
        } => eprintln!("warning: {table} could not be written; run the command again."),
    }
}

pub fn print_purge(table: &str, report: PurgeReport, dropped: bool) {
    println!(
        "{table}: {} documents deleted in {} batches{}",
        report.deleted,
        report.batches,
        if dropped { ", table removed" } else { "" }
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn count_cell(value: u64, separator: Option<char>) -> Cell {
    let text = group_thousands(value, separator);
    if value > 0 {
        Cell::new(text).fg(Color::Green)
    } else {
        dim_cell(text)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
