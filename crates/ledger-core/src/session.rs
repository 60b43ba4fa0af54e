//! Session-scoped editing state for one table.

use chrono::{DateTime, Utc};
use ledger_model::{AuditEntry, Row, RowId, TableKey, TeamRoster, TextField, UserId};
use ledger_model::parse_contribution;
use ledger_store::DocumentStore;

use crate::audit::to_audit_entries;
use crate::diff::diff;
use crate::dirty::{ConfirmGate, DirtyTracker, LeaveDecision, NavigationIntent};
use crate::error::{LedgerError, Result};
use crate::persist::commit;
use crate::snapshot::{LoadOrigin, LoadedTable, Snapshot, load_table, read_table};

/// Result of an explicit save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Working copy and audit entries were committed. `entries` is empty
    /// when the only difference carries no field change, such as a blank new
    /// row.
    Saved { entries: Vec<AuditEntry> },
    /// Nothing differed from the baseline; no write was issued.
    NoChanges,
}

/// One user's working copy of one table, with its baseline.
///
/// Every edit goes through this type so the dirty flag is recomputed after
/// each change. Sessions share nothing with each other.
#[derive(Debug)]
pub struct TableSession {
    key: TableKey,
    roster: TeamRoster,
    working: Vec<Row>,
    snapshot: Snapshot,
    tracker: DirtyTracker,
    origin: LoadOrigin,
}

impl TableSession {
    /// Loads `key` from the store, falling back to `initial` when absent.
    pub async fn open<S, F>(store: &S, key: TableKey, roster: TeamRoster, initial: F) -> Result<Self>
    where
        S: DocumentStore + ?Sized,
        F: FnOnce() -> Vec<Row>,
    {
        let loaded = load_table(store, &key, &roster, initial).await?;
        Ok(Self::from_loaded(key, roster, loaded))
    }

    /// Loads `key` only if it is stored; nothing is written when it is absent.
    pub async fn open_existing<S>(
        store: &S,
        key: TableKey,
        roster: TeamRoster,
    ) -> Result<Option<Self>>
    where
        S: DocumentStore + ?Sized,
    {
        let loaded = read_table(store, &key, &roster).await?;
        Ok(loaded.map(|loaded| Self::from_loaded(key, roster, loaded)))
    }

    fn from_loaded(key: TableKey, roster: TeamRoster, loaded: LoadedTable) -> Self {
        Self {
            key,
            roster,
            working: loaded.working,
            snapshot: loaded.snapshot,
            tracker: DirtyTracker::new(),
            origin: loaded.origin,
        }
    }

    pub fn key(&self) -> &TableKey {
        &self.key
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn rows(&self) -> &[Row] {
        &self.working
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.working.iter().find(|row| row.id == id)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    /// Replace a text field of a row.
    pub fn set_text(&mut self, id: RowId, field: TextField, value: impl Into<String>) -> Result<()> {
        *self.row_mut(id)?.text_mut(field) = value.into();
        self.refresh();
        Ok(())
    }

    /// Set one contribution slot from raw user input.
    ///
    /// Negative or non-numeric input and unknown slots are rejected before
    /// the working copy is touched.
    pub fn set_contribution(&mut self, id: RowId, slot: usize, raw: &str) -> Result<u64> {
        self.roster.check_slot(slot)?;
        let value = parse_contribution(raw)?;
        let team_count = self.roster.len();
        let row = self.row_mut(id)?;
        row.fit_to_roster(team_count);
        row.contributions[slot] = value;
        self.refresh();
        Ok(value)
    }

    /// Set or clear (blank text) the comment of `user` on a row.
    pub fn set_comment(&mut self, id: RowId, user: &UserId, text: &str) -> Result<()> {
        let row = self.row_mut(id)?;
        let text = text.trim();
        if text.is_empty() {
            row.comments.remove(user);
        } else {
            row.comments.insert(user.clone(), text.to_string());
        }
        self.refresh();
        Ok(())
    }

    /// Append a blank row and return its id (largest id + 1).
    pub fn add_row(&mut self, thematique: impl Into<String>) -> RowId {
        let id = RowId::next_after(self.working.iter().map(|row| row.id));
        self.working
            .push(Row::new(id, thematique, self.roster.len()));
        self.refresh();
        id
    }

    /// Revert the working copy to the baseline.
    pub fn discard(&mut self) {
        self.working = self.snapshot.to_working_copy();
        self.refresh();
    }

    /// Guarded navigation away from the table (leave view, log out).
    pub fn request_leave<G>(&mut self, intent: NavigationIntent, gate: &mut G) -> LeaveDecision
    where
        G: ConfirmGate + ?Sized,
    {
        if !self.is_dirty() {
            return LeaveDecision::Proceed;
        }
        if gate.confirm_discard(intent) {
            tracing::info!(table = %self.key, ?intent, "unsaved changes discarded");
            self.discard();
            LeaveDecision::Discarded
        } else {
            LeaveDecision::Stay
        }
    }

    /// Diff, audit and commit the working copy as `user`, stamped now.
    pub async fn save<S>(&mut self, store: &S, user: &UserId) -> Result<SaveOutcome>
    where
        S: DocumentStore + ?Sized,
    {
        self.save_at(store, user, Utc::now()).await
    }

    /// Same as [`TableSession::save`] with an explicit timestamp.
    pub async fn save_at<S>(
        &mut self,
        store: &S,
        user: &UserId,
        at: DateTime<Utc>,
    ) -> Result<SaveOutcome>
    where
        S: DocumentStore + ?Sized,
    {
        let changes = diff(&self.working, &self.snapshot, &self.roster);
        if changes.is_empty() && !self.differs() {
            tracing::info!(table = %self.key, "nothing to save");
            self.refresh();
            return Ok(SaveOutcome::NoChanges);
        }

        let entries = to_audit_entries(&changes, user, at, &self.key);
        self.tracker.start_save();
        match commit(store, &self.key, &self.working, &entries, user, at).await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.tracker.finish_save(self.differs());
                Ok(SaveOutcome::Saved { entries })
            }
            Err(source) => {
                tracing::warn!(table = %self.key, error = %source, "commit failed");
                self.tracker.finish_save(self.differs());
                Err(LedgerError::Commit {
                    table: self.key.clone(),
                    source,
                })
            }
        }
    }

    fn row_mut(&mut self, id: RowId) -> Result<&mut Row> {
        self.working
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(LedgerError::UnknownRow(id))
    }

    fn differs(&self) -> bool {
        self.working.as_slice() != self.snapshot.rows()
    }

    fn refresh(&mut self) {
        let differs = self.differs();
        self.tracker.observe(differs);
    }
}
