use serde::{Deserialize, Serialize};

/// Page-scoped storage keys. These survive reloads and are never synced.
pub const KEY_ACTIVE: &str = "devpulse_active";
pub const KEY_POSITION: &str = "devpulse_pos";
pub const KEY_COLLAPSED: &str = "devpulse_collapsed";

/// Last known screen position of the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HudPosition {
    pub x: f64,
    pub y: f64,
}

/// Advisory UI state consumed by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HudPreferences {
    pub collapsed: bool,
    pub position: Option<HudPosition>,
}
