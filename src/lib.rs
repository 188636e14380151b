//! DevPulse: an in-page developer HUD core.
//!
//! Two halves joined only by runtime messages: the background tab coordinator
//! (`services::coordinator`) and the in-page sampling engine
//! (`services::sampling_engine`, driven by `services::page_agent`).

pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
