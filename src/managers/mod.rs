// DevPulse state managers
// Managers hold in-memory state only: the coordinator's per-tab beliefs.

pub mod tab_manager;
