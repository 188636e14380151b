//! Newline-delimited JSON bridge between the coordinator and a browser shell.
//!
//! Outgoing commands carry a numeric `id`; the shell answers each with a
//! `{"event":"reply","id":..,"result":..}` (or `"error"`) line, which
//! [`StdioBridge::complete`] routes back to the waiting request.
//!
//! Commands:  `sendMessage`, `executeScript`, `getUser`, `openPaymentPage`
//! Events:    `toggle`, `tabRemoved`, `tabUpdated`, `message`, `reply`, `paid`

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Write};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::rpc_handler::handle_runtime_message;
use crate::services::coordinator::{TabCoordinator, ToggleOutcome};
use crate::services::entitlement::EntitlementService;
use crate::services::messaging::{PageMessenger, ScriptInjector};
use crate::types::errors::{EntitlementError, InjectionError, MessagingError};
use crate::types::message::HudMessage;
use crate::types::tab::TabId;

type ReplySender = oneshot::Sender<Result<Value, String>>;

/// One inbound line from the browser shell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// Toolbar click on a tab.
    Toggle {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        #[serde(default)]
        url: String,
    },
    TabRemoved {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    TabUpdated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        #[serde(default)]
        status: Option<String>,
    },
    /// Runtime message from a page. `id` is set when the page wants a reply.
    Message {
        #[serde(default)]
        id: Option<u64>,
        #[serde(rename = "tabId", default)]
        tab_id: Option<TabId>,
        message: Value,
    },
    /// Answer to one of our commands.
    Reply {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<String>,
    },
    /// The payment flow reported a purchase.
    Paid,
}

/// Removes a pending request if its future is dropped before the reply lands.
struct PendingGuard<'a, W> {
    bridge: &'a StdioBridge<W>,
    id: u64,
}

impl<W> Drop for PendingGuard<'_, W> {
    fn drop(&mut self) {
        self.bridge.pending.borrow_mut().remove(&self.id);
    }
}

/// Request/reply transport over a line-oriented writer.
pub struct StdioBridge<W> {
    out: RefCell<W>,
    next_id: Cell<u64>,
    pending: RefCell<HashMap<u64, ReplySender>>,
    closed: Cell<bool>,
}

impl<W: Write> StdioBridge<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            next_id: Cell::new(1),
            pending: RefCell::new(HashMap::new()),
            closed: Cell::new(false),
        }
    }

    /// Write one JSON line and flush.
    pub fn emit(&self, value: &Value) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", value)?;
        out.flush()
    }

    /// Route a reply to its waiting request. Returns `false` for unknown ids
    /// (late replies to requests that already timed out).
    pub fn complete(&self, id: u64, result: Result<Value, String>) -> bool {
        match self.pending.borrow_mut().remove(&id) {
            Some(tx) => tx.send(result).is_ok(),
            None => {
                debug!(id, "reply for unknown request");
                false
            }
        }
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.borrow().len()
    }

    /// The shell went away. Fails every request still waiting for a reply and
    /// every later one; returns how many were waiting.
    pub fn close(&self) -> usize {
        self.closed.set(true);
        let abandoned: Vec<_> = self.pending.borrow_mut().drain().collect();
        abandoned.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Consume the bridge and hand back the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Read access to the writer.
    pub fn with_output<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.out.borrow())
    }

    async fn request(&self, mut command: Value) -> Result<Value, String> {
        if self.closed.get() {
            return Err("bridge closed".to_string());
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(id, tx);
        let _guard = PendingGuard { bridge: self, id };

        if let Some(obj) = command.as_object_mut() {
            obj.insert("id".to_string(), json!(id));
        }
        self.emit(&command).map_err(|e| format!("write failed: {}", e))?;

        rx.await
            .unwrap_or_else(|_| Err("bridge dropped the request".to_string()))
    }
}

fn messaging_error(err: String) -> MessagingError {
    if err.contains("Receiving end does not exist") {
        MessagingError::NoReceiver
    } else {
        MessagingError::ChannelClosed(err)
    }
}

fn injection_error(err: String) -> InjectionError {
    let lower = err.to_lowercase();
    if lower.contains("permission") || lower.contains("cannot access") {
        InjectionError::PermissionDenied(err)
    } else if lower.contains("no tab with id") {
        InjectionError::InvalidTarget(err)
    } else {
        InjectionError::Failed(err)
    }
}

impl<W: Write> PageMessenger for StdioBridge<W> {
    async fn send(&self, tab_id: TabId, message: HudMessage) -> Result<Option<Value>, MessagingError> {
        let message = serde_json::to_value(&message)
            .map_err(|e| MessagingError::InvalidReply(e.to_string()))?;
        let reply = self
            .request(json!({"command": "sendMessage", "tabId": tab_id, "message": message}))
            .await
            .map_err(messaging_error)?;
        Ok(if reply.is_null() { None } else { Some(reply) })
    }
}

impl<W: Write> ScriptInjector for StdioBridge<W> {
    async fn inject(&self, tab_id: TabId, file: &str) -> Result<(), InjectionError> {
        self.request(json!({"command": "executeScript", "tabId": tab_id, "files": [file]}))
            .await
            .map(|_| ())
            .map_err(injection_error)
    }
}

impl<W: Write> EntitlementService for StdioBridge<W> {
    async fn fetch_paid(&self) -> Result<bool, EntitlementError> {
        let user = self
            .request(json!({"command": "getUser"}))
            .await
            .map_err(EntitlementError::Unavailable)?;
        Ok(user.get("paid").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn open_payment_page(&self) -> Result<(), EntitlementError> {
        self.emit(&json!({"command": "openPaymentPage"}))
            .map_err(|e| EntitlementError::Unavailable(e.to_string()))
    }
}

/// Line written back when `event` is refused before dispatch. A message
/// that expects a reply is answered with the error so its sender stops waiting.
pub fn rejection_report(event: &BridgeEvent, error: &str) -> Value {
    match event {
        BridgeEvent::Message { id: Some(id), .. } => json!({"replyTo": id, "error": error}),
        _ => json!({"event": "error", "error": error}),
    }
}

fn toggle_report(tab_id: TabId, outcome: ToggleOutcome) -> Value {
    match outcome {
        ToggleOutcome::Hidden => json!({"event": "toggled", "tabId": tab_id, "outcome": "hidden"}),
        ToggleOutcome::Shown {
            injected,
            is_premium,
        } => json!({
            "event": "toggled",
            "tabId": tab_id,
            "outcome": "shown",
            "injected": injected,
            "isPremium": is_premium
        }),
        ToggleOutcome::InitFailed => {
            json!({"event": "toggled", "tabId": tab_id, "outcome": "initFailed"})
        }
    }
}

/// Apply one inbound event. Anything worth reporting is written back on `bridge`.
pub async fn dispatch_event<M, I, E, W>(
    coordinator: &TabCoordinator<M, I, E>,
    bridge: &StdioBridge<W>,
    event: BridgeEvent,
) where
    M: PageMessenger,
    I: ScriptInjector,
    E: EntitlementService,
    W: Write,
{
    let report = match event {
        BridgeEvent::Reply { id, result, error } => {
            let result = match error {
                Some(err) => Err(err),
                None => Ok(result.unwrap_or(Value::Null)),
            };
            bridge.complete(id, result);
            None
        }
        BridgeEvent::Toggle { tab_id, url } => Some(match coordinator.toggle(tab_id, &url).await {
            Ok(outcome) => toggle_report(tab_id, outcome),
            Err(e) => json!({"event": "toggleFailed", "tabId": tab_id, "error": e.to_string()}),
        }),
        BridgeEvent::TabRemoved { tab_id } => {
            coordinator.on_tab_removed(tab_id);
            None
        }
        BridgeEvent::TabUpdated { tab_id, status } => {
            if status.as_deref() == Some("loading") {
                coordinator.on_navigation_start(tab_id);
            }
            None
        }
        BridgeEvent::Message {
            id,
            tab_id,
            message,
        } => {
            let result = handle_runtime_message(coordinator, tab_id, &message).await;
            match (id, result) {
                (Some(id), Ok(value)) => Some(json!({"replyTo": id, "result": value})),
                (Some(id), Err(err)) => Some(json!({"replyTo": id, "error": err})),
                (None, Err(err)) => {
                    debug!(error = %err, "dropping unroutable message");
                    None
                }
                (None, Ok(_)) => None,
            }
        }
        BridgeEvent::Paid => {
            coordinator.on_paid();
            None
        }
    };

    if let Some(report) = report {
        if let Err(e) = bridge.emit(&report) {
            warn!(error = %e, "could not write report");
        }
    }
}
