// DevPulse services
// Behavioural components: the tab coordinator and its seams, the entitlement
// cache, the in-page agent with its sampling engine and storage, settings,
// and the stdio bridge.

pub mod bridge;
pub mod coordinator;
pub mod entitlement;
pub mod local_store;
pub mod messaging;
pub mod page_agent;
pub mod sampling_engine;
pub mod settings_engine;
