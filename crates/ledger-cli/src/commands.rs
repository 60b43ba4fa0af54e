//! Ledger operations behind each subcommand.
//!
//! Every mutating operation runs one session: load, edit, save.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use ledger_core::{SaveOutcome, TableSession, audit_log, delete_table, purge_audit};
use ledger_model::{AuditEntry, Row, RowId, TableKey, TeamRoster, TextField, UserId};
use ledger_query::{Aggregation, RowSource, SortKey, StoredTable, aggregate, export_csv};
use ledger_store::{FileStore, PurgeReport};

use crate::config::LedgerConfig;

/// What a `set` command writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Text(TextField),
    Team(usize),
}

/// Resolves a field name: a text field key, a team name, or `team-<n>`.
pub fn parse_field(raw: &str, roster: &TeamRoster) -> Option<FieldTarget> {
    if let Ok(field) = raw.parse::<TextField>() {
        return Some(FieldTarget::Text(field));
    }
    team_slot(raw, roster).map(FieldTarget::Team)
}

/// Resolves a sort column: `id`, `total`, a text field key or a team.
pub fn parse_sort_key(raw: &str, roster: &TeamRoster) -> Option<SortKey> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "id" => Some(SortKey::Id),
        "total" => Some(SortKey::Total),
        _ => match parse_field(raw, roster)? {
            FieldTarget::Text(field) => Some(SortKey::Field(field)),
            FieldTarget::Team(slot) => Some(SortKey::Slot(slot)),
        },
    }
}

/// Slot of a team given by name or by its `team-<n>` fallback label.
pub fn team_slot(raw: &str, roster: &TeamRoster) -> Option<usize> {
    let raw = raw.trim();
    roster.slot_of(raw).or_else(|| {
        (0..roster.len()).find(|slot| roster.name(*slot).eq_ignore_ascii_case(raw))
    })
}

/// A configured ledger: roster, store and settings.
pub struct Ledger {
    config: LedgerConfig,
    roster: TeamRoster,
    store: FileStore,
}

impl Ledger {
    pub fn open(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let roster = config.roster()?;
        let store = FileStore::open(config.store_path()).with_max_batch_ops(config.max_batch_ops);
        tracing::debug!(store = %store.path().display(), teams = roster.len(), "ledger opened");
        Ok(Self {
            config,
            roster,
            store,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    /// Opens `key`; an absent table starts with one row per label and is
    /// written back.
    pub async fn init_table(&self, key: &TableKey, labels: &[String]) -> Result<TableSession> {
        let team_count = self.roster.len();
        let session = TableSession::open(&self.store, key.clone(), self.roster.clone(), || {
            labels
                .iter()
                .zip(1u64..)
                .map(|(label, id)| Row::new(RowId::new(id), label.as_str(), team_count))
                .collect()
        })
        .await
        .with_context(|| format!("failed to open table {key}"))?;
        Ok(session)
    }

    /// Opens a stored table; an absent one is an error and nothing is written.
    pub async fn open_table(&self, key: &TableKey) -> Result<TableSession> {
        TableSession::open_existing(&self.store, key.clone(), self.roster.clone())
            .await
            .with_context(|| format!("failed to open table {key}"))?
            .ok_or_else(|| anyhow!("table {key} does not exist; create it with `ledger init`"))
    }

    /// Sets a text field or a team contribution of one row, then saves.
    pub async fn set_field(
        &self,
        key: &TableKey,
        row: RowId,
        field: &str,
        value: &str,
        user: &UserId,
    ) -> Result<SaveOutcome> {
        let target = parse_field(field, &self.roster)
            .ok_or_else(|| anyhow!("unknown field or team: {field}"))?;
        let mut session = self.open_table(key).await?;
        match target {
            FieldTarget::Text(field) => session.set_text(row, field, value)?,
            FieldTarget::Team(slot) => {
                session.set_contribution(row, slot, value)?;
            }
        }
        save(&mut session, &self.store, user).await
    }

    /// Appends a row and saves; returns its id.
    pub async fn add_row(
        &self,
        key: &TableKey,
        thematique: &str,
        user: &UserId,
    ) -> Result<(RowId, SaveOutcome)> {
        if thematique.trim().is_empty() {
            bail!("a row needs a thematic label");
        }
        let mut session = self.open_table(key).await?;
        let id = session.add_row(thematique.trim());
        let outcome = save(&mut session, &self.store, user).await?;
        Ok((id, outcome))
    }

    /// Sets (or with blank text, removes) the user's comment on a row, then saves.
    pub async fn comment(
        &self,
        key: &TableKey,
        row: RowId,
        text: &str,
        user: &UserId,
    ) -> Result<SaveOutcome> {
        let mut session = self.open_table(key).await?;
        session.set_comment(row, user, text)?;
        save(&mut session, &self.store, user).await
    }

    pub async fn audit(&self, key: &TableKey) -> Result<Vec<AuditEntry>> {
        audit_log(&self.store, key)
            .await
            .with_context(|| format!("failed to read the audit log of {key}"))
    }

    /// Merges the configured tables, or `keys` when given.
    pub async fn aggregate(&self, keys: &[TableKey]) -> Result<Aggregation> {
        let keys = if keys.is_empty() {
            self.config.table_keys()?
        } else {
            keys.to_vec()
        };
        if keys.is_empty() {
            bail!("no tables to aggregate; list them under [[tables]] in the config");
        }
        let tables: Vec<StoredTable<'_>> = keys
            .into_iter()
            .map(|key| StoredTable::new(&self.store, key))
            .collect();
        let sources: Vec<&dyn RowSource> =
            tables.iter().map(|table| table as &dyn RowSource).collect();
        Ok(aggregate(&sources).await)
    }

    /// Writes `rows` as CSV using the configured export settings.
    pub fn export<R, W>(&self, rows: &[R], writer: W) -> Result<()>
    where
        R: AsRef<Row>,
        W: Write,
    {
        let options = self.config.export_options()?;
        export_csv(rows, &self.roster, writer, &options).context("CSV export failed")
    }

    /// Purges the audit log of `key`; with `drop_table`, the table too.
    pub async fn purge(&self, key: &TableKey, drop_table: bool) -> Result<PurgeReport> {
        let policy = self.config.chunk_policy();
        let report = if drop_table {
            delete_table(&self.store, key, policy).await
        } else {
            purge_audit(&self.store, key, policy).await
        };
        report.with_context(|| format!("failed to purge {key}"))
    }
}

async fn save(session: &mut TableSession, store: &FileStore, user: &UserId) -> Result<SaveOutcome> {
    let outcome = session.save(store, user).await?;
    if let SaveOutcome::Saved { entries } = &outcome {
        tracing::info!(table = %session.key(), user = %user, changes = entries.len(), "saved");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> TeamRoster {
        TeamRoster::new(["Nord", "", "Sud"]).unwrap()
    }

    #[test]
    fn fields_resolve_to_text_or_team() {
        let roster = roster();
        assert_eq!(
            parse_field("synthese", &roster),
            Some(FieldTarget::Text(TextField::Synthese))
        );
        assert_eq!(parse_field("sud", &roster), Some(FieldTarget::Team(2)));
        assert_eq!(parse_field("team-2", &roster), Some(FieldTarget::Team(1)));
        assert_eq!(parse_field("est", &roster), None);
    }

    #[test]
    fn sort_keys_resolve() {
        let roster = roster();
        assert_eq!(parse_sort_key("TOTAL", &roster), Some(SortKey::Total));
        assert_eq!(parse_sort_key("id", &roster), Some(SortKey::Id));
        assert_eq!(parse_sort_key("Nord", &roster), Some(SortKey::Slot(0)));
        assert_eq!(
            parse_sort_key("nature", &roster),
            Some(SortKey::Field(TextField::Nature))
        );
        assert_eq!(parse_sort_key("nope", &roster), None);
    }
}
