use serde::{Deserialize, Serialize};

/// Browser-assigned tab identifier.
pub type TabId = u32;

/// What the coordinator currently believes about one tab.
///
/// Both flags are beliefs, not ground truth: they are reconciled with a fresh
/// presence check before any visible-affecting action. `visible` implies `instrumented`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub instrumented: bool,
    pub visible: bool,
}

impl TabRecord {
    pub fn state(&self) -> TabState {
        match (self.instrumented, self.visible) {
            (_, true) => TabState::InstrumentedVisible,
            (true, false) => TabState::InstrumentedHidden,
            (false, false) => TabState::Uninstrumented,
        }
    }
}

/// Per-tab lifecycle state derived from a [`TabRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabState {
    Uninstrumented,
    InstrumentedHidden,
    InstrumentedVisible,
}

