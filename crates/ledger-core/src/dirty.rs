//! Unsaved-change tracking and the navigation guard it feeds.

/// Tracks whether a session holds unsaved changes.
///
/// The flag is derived, never set by hand: callers report the result of
/// comparing the working copy with its baseline through [`DirtyTracker::observe`].
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    /// Whether the working copy differs from the baseline.
    dirty: bool,

    /// Whether a commit is in flight.
    saving: bool,
}

impl DirtyTracker {
    /// Create a new tracker with no unsaved changes.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Record the outcome of a working copy / baseline comparison.
    pub fn observe(&mut self, differs: bool) {
        self.dirty = differs;
    }

    pub fn start_save(&mut self) {
        self.saving = true;
    }

    /// Mark that a save has finished; `differs` is the fresh comparison.
    pub fn finish_save(&mut self, differs: bool) {
        self.saving = false;
        self.observe(differs);
    }
}

/// Navigation that would drop the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    LeaveTable,
    LogOut,
}

/// Asks the user whether unsaved changes may be discarded.
pub trait ConfirmGate {
    fn confirm_discard(&mut self, intent: NavigationIntent) -> bool;
}

impl<F> ConfirmGate for F
where
    F: FnMut(NavigationIntent) -> bool,
{
    fn confirm_discard(&mut self, intent: NavigationIntent) -> bool {
        self(intent)
    }
}

/// Outcome of a guarded navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Nothing was unsaved.
    Proceed,
    /// The user confirmed; the working copy was reverted to the baseline.
    Discarded,
    /// The user declined; stay on the table.
    Stay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tracker_is_clean() {
        let tracker = DirtyTracker::new();
        assert!(!tracker.is_dirty());
        assert!(!tracker.is_saving());
    }

    #[test]
    fn observe_follows_the_comparison() {
        let mut tracker = DirtyTracker::new();
        tracker.observe(true);
        assert!(tracker.is_dirty());

        tracker.observe(false);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn failed_save_stays_dirty() {
        let mut tracker = DirtyTracker::new();
        tracker.observe(true);
        tracker.start_save();
        assert!(tracker.is_saving());

        tracker.finish_save(true);
        assert!(tracker.is_dirty());
        assert!(!tracker.is_saving());
    }

    #[test]
    fn closures_are_confirm_gates() {
        let mut asked = Vec::new();
        let mut gate = |intent: NavigationIntent| {
            asked.push(intent);
            false
        };
        assert!(!gate.confirm_discard(NavigationIntent::LogOut));
        assert_eq!(asked, [NavigationIntent::LogOut]);
    }
}
