// DevPulse shared type definitions
// Each submodule defines types used by both the coordinator and the in-page engine.

pub mod errors;
pub mod hud;
pub mod message;
pub mod metrics;
pub mod settings;
pub mod tab;
