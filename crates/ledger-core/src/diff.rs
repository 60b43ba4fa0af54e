//! Field-level comparison of a working copy against its baseline.

use std::collections::HashMap;

use ledger_model::{ChangeField, ChangeRecord, FieldValue, Row, RowId, TeamRoster, TextField};

use crate::snapshot::Snapshot;

/// Lists every field that differs between `working` and `snapshot`.
///
/// Rows are matched by id. A row with no baseline counterpart is compared
/// against a blank row, so each of its non-empty fields is reported. Rows
/// that only exist in the baseline are not reported.
///
/// Records come in working-copy row order; within a row: text fields in
/// schema order, then contribution slots by index, then the comment map as a
/// single record.
pub fn diff(working: &[Row], snapshot: &Snapshot, roster: &TeamRoster) -> Vec<ChangeRecord> {
    let baseline: HashMap<RowId, &Row> = snapshot.rows().iter().map(|row| (row.id, row)).collect();

    let mut changes = Vec::new();
    for row in working {
        match baseline.get(&row.id) {
            Some(old) => diff_row(old, row, roster, &mut changes),
            None => {
                let blank = Row::new(row.id, "", row.contributions.len());
                diff_row(&blank, row, roster, &mut changes);
            }
        }
    }
    tracing::debug!(rows = working.len(), changes = changes.len(), "diff computed");
    changes
}

fn diff_row(old: &Row, new: &Row, roster: &TeamRoster, out: &mut Vec<ChangeRecord>) {
    let record = |field: ChangeField, old_value: FieldValue, new_value: FieldValue| ChangeRecord {
        row_id: new.id,
        row_label: new.thematique.clone(),
        field,
        old_value,
        new_value,
    };

    for field in TextField::ALL {
        let (before, after) = (old.text(field), new.text(field));
        if before != after {
            out.push(record(
                ChangeField::Text(field),
                FieldValue::Text(before.to_string()),
                FieldValue::Text(after.to_string()),
            ));
        }
    }

    let slots = old.contributions.len().max(new.contributions.len());
    for slot in 0..slots {
        let (before, after) = (old.slot(slot), new.slot(slot));
        if before != after {
            out.push(record(
                ChangeField::Contribution {
                    slot,
                    team: roster.name(slot),
                },
                FieldValue::Count(before),
                FieldValue::Count(after),
            ));
        }
    }

    if old.comments != new.comments {
        out.push(record(
            ChangeField::Comments,
            FieldValue::Comments(old.comments.clone()),
            FieldValue::Comments(new.comments.clone()),
        ));
    }
}
