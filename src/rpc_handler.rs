//! Runtime message dispatch for DevPulse.
//!
//! Messages arrive as raw JSON objects tagged by `"action"`. These functions
//! parse them, route them to the coordinator (page → coordinator kinds) or to
//! a page agent (coordinator → page kinds) and serialize the reply.
//! A message that expects no reply yields `Value::Null`.

use serde_json::Value;

use crate::services::coordinator::TabCoordinator;
use crate::services::entitlement::EntitlementService;
use crate::services::local_store::LocalStore;
use crate::services::messaging::{PageMessenger, ScriptInjector};
use crate::services::page_agent::{HudAgent, RuntimeLink};
use crate::services::sampling_engine::PagePlatform;
use crate::types::message::HudMessage;
use crate::types::tab::TabId;

/// Parse a raw runtime message.
pub fn parse_message(raw: &Value) -> Result<HudMessage, String> {
    let action = raw
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or("missing action")?;
    serde_json::from_value(raw.clone())
        .map_err(|e| format!("unknown or malformed action '{}': {}", action, e))
}

/// Dispatch a message sent by a page (`sender`) to the coordinator.
pub async fn handle_runtime_message<M, I, E>(
    coordinator: &TabCoordinator<M, I, E>,
    sender: Option<TabId>,
    raw: &Value,
) -> Result<Value, String>
where
    M: PageMessenger,
    I: ScriptInjector,
    E: EntitlementService,
{
    let message = parse_message(raw)?;
    if message.is_page_bound() {
        return Err(format!("'{}' is not handled by the coordinator", message.action()));
    }
    Ok(coordinator
        .handle_runtime_message(sender, message)
        .await
        .unwrap_or(Value::Null))
}

/// Dispatch a message sent by the coordinator to a page agent.
pub async fn handle_page_message<S, L, P>(
    agent: &mut HudAgent<S, L, P>,
    raw: &Value,
) -> Result<Value, String>
where
    S: LocalStore,
    L: RuntimeLink,
    P: PagePlatform,
{
    let message = parse_message(raw)?;
    if !message.is_page_bound() {
        return Err(format!("'{}' is not handled by the page", message.action()));
    }
    Ok(agent.handle_message(message).await.unwrap_or(Value::Null))
}
