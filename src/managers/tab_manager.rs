use std::collections::{HashMap, HashSet};

use crate::types::errors::ToggleError;
use crate::types::tab::{TabId, TabRecord, TabState};

/// Trait defining the per-tab belief interface.
pub trait TabManagerTrait {
    fn record(&self, tab_id: TabId) -> Option<TabRecord>;
    fn state(&self, tab_id: TabId) -> TabState;
    fn is_instrumented(&self, tab_id: TabId) -> bool;
    fn mark_instrumented(&mut self, tab_id: TabId);
    fn clear_instrumented(&mut self, tab_id: TabId);
    fn mark_visible(&mut self, tab_id: TabId);
    fn mark_hidden(&mut self, tab_id: TabId);
    fn forget(&mut self, tab_id: TabId);
    fn reset(&mut self, tab_id: TabId);
    fn begin_toggle(&mut self, tab_id: TabId) -> Result<(), ToggleError>;
    fn end_toggle(&mut self, tab_id: TabId);
    fn is_in_flight(&self, tab_id: TabId) -> bool;
    fn tab_count(&self) -> usize;
}

/// In-memory map of what the coordinator believes about each tab.
///
/// Records are created lazily on first toggle and never persisted.
pub struct TabManager {
    records: HashMap<TabId, TabRecord>,
    in_flight: HashSet<TabId>,
    // Tabs closed while a toggle was still running.
    orphaned: HashSet<TabId>,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            in_flight: HashSet::new(),
            orphaned: HashSet::new(),
        }
    }

    fn entry(&mut self, tab_id: TabId) -> &mut TabRecord {
        self.records.entry(tab_id).or_default()
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabManagerTrait for TabManager {
    fn record(&self, tab_id: TabId) -> Option<TabRecord> {
        self.records.get(&tab_id).copied()
    }

    fn state(&self, tab_id: TabId) -> TabState {
        self.records
            .get(&tab_id)
            .map(TabRecord::state)
            .unwrap_or(TabState::Uninstrumented)
    }

    fn is_instrumented(&self, tab_id: TabId) -> bool {
        self.records
            .get(&tab_id)
            .map(|r| r.instrumented)
            .unwrap_or(false)
    }

    fn mark_instrumented(&mut self, tab_id: TabId) {
        self.entry(tab_id).instrumented = true;
    }

    /// Drop the instrumented belief so the next toggle re-injects.
    /// Also clears `visible` to keep `visible ⇒ instrumented`.
    fn clear_instrumented(&mut self, tab_id: TabId) {
        if let Some(record) = self.records.get_mut(&tab_id) {
            record.instrumented = false;
            record.visible = false;
        }
    }

    fn mark_visible(&mut self, tab_id: TabId) {
        let record = self.entry(tab_id);
        record.instrumented = true;
        record.visible = true;
    }

    fn mark_hidden(&mut self, tab_id: TabId) {
        if let Some(record) = self.records.get_mut(&tab_id) {
            record.visible = false;
        }
    }

    /// Tab closed: drop every belief about it. A toggle still running for the
    /// tab may write to the map again, so its record is dropped once more when
    /// that toggle ends.
    fn forget(&mut self, tab_id: TabId) {
        self.records.remove(&tab_id);
        if self.in_flight.contains(&tab_id) {
            self.orphaned.insert(tab_id);
        }
    }

    /// New navigation started: injected code is gone, so both flags reset.
    fn reset(&mut self, tab_id: TabId) {
        if let Some(record) = self.records.get_mut(&tab_id) {
            *record = TabRecord::default();
        }
    }

    fn begin_toggle(&mut self, tab_id: TabId) -> Result<(), ToggleError> {
        if !self.in_flight.insert(tab_id) {
            return Err(ToggleError::InFlight(tab_id));
        }
        Ok(())
    }

    fn end_toggle(&mut self, tab_id: TabId) {
        self.in_flight.remove(&tab_id);
        if self.orphaned.remove(&tab_id) {
            self.records.remove(&tab_id);
        }
    }

    fn is_in_flight(&self, tab_id: TabId) -> bool {
        self.in_flight.contains(&tab_id)
    }

    fn tab_count(&self) -> usize {
        self.records.len()
    }
}
