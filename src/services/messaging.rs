//! Seams between the coordinator and the host browser.
//!
//! Both are best-effort: no retry, no delivery guarantee. Implementations
//! report failure through their error types and never panic.

use std::rc::Rc;

use serde_json::Value;

use crate::types::errors::{InjectionError, MessagingError};
use crate::types::message::HudMessage;
use crate::types::tab::TabId;

/// Sends runtime messages to the page loaded in a tab.
#[allow(async_fn_in_trait)]
pub trait PageMessenger {
    /// Deliver `message` to `tab_id`. `Ok(None)` means delivered without a reply.
    async fn send(&self, tab_id: TabId, message: HudMessage)
        -> Result<Option<Value>, MessagingError>;
}

/// Installs the instrumentation payload into a page.
#[allow(async_fn_in_trait)]
pub trait ScriptInjector {
    async fn inject(&self, tab_id: TabId, file: &str) -> Result<(), InjectionError>;
}

impl<T: PageMessenger> PageMessenger for Rc<T> {
    async fn send(&self, tab_id: TabId, message: HudMessage)
        -> Result<Option<Value>, MessagingError> {
        (**self).send(tab_id, message).await
    }
}

impl<T: ScriptInjector> ScriptInjector for Rc<T> {
    async fn inject(&self, tab_id: TabId, file: &str) -> Result<(), InjectionError> {
        (**self).inject(tab_id, file).await
    }
}
