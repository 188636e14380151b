//! Tab coordinator for DevPulse.
//!
//! Decides, per tab, whether instrumentation is present and whether the
//! overlay is showing. Every decision combines a cached belief with a fresh
//! presence check, and every messaging failure biases toward re-checking or
//! re-injecting on the next toggle rather than getting stuck.
//!
//! The coordinator is single-threaded: beliefs live in a `RefCell` that is
//! never borrowed across an `.await`.

use std::cell::RefCell;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::services::entitlement::{EntitlementCache, EntitlementService};
use crate::services::messaging::{PageMessenger, ScriptInjector};
use crate::types::errors::{MessagingError, ToggleError};
use crate::types::message::{HudMessage, PingReply, StateReply};
use crate::types::settings::CoordinatorSettings;
use crate::types::tab::{TabId, TabRecord, TabState};

/// Result of a toggle that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The presence check found a visible HUD and a teardown was sent.
    Hidden,
    /// `init` was delivered; the overlay is believed visible.
    Shown { injected: bool, is_premium: bool },
    /// `init` could not be delivered; the instrumented belief was rolled back.
    InitFailed,
}

/// Releases the per-tab in-flight marker on every exit path of a toggle.
struct ToggleGuard<'a> {
    tabs: &'a RefCell<TabManager>,
    tab_id: TabId,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.tabs.borrow_mut().end_toggle(self.tab_id);
    }
}

/// Background-side owner of per-tab presence and visibility beliefs.
pub struct TabCoordinator<M, I, E> {
    messenger: M,
    injector: I,
    entitlement: EntitlementCache<E>,
    tabs: RefCell<TabManager>,
    settings: CoordinatorSettings,
}

impl<M, I, E> TabCoordinator<M, I, E>
where
    M: PageMessenger,
    I: ScriptInjector,
    E: EntitlementService,
{
    pub fn new(messenger: M, injector: I, entitlement: E, settings: CoordinatorSettings) -> Self {
        let revalidate = settings
            .entitlement_revalidate_secs
            .map(Duration::from_secs);
        let fetch_timeout = Duration::from_millis(settings.message_timeout_ms);
        Self {
            messenger,
            injector,
            entitlement: EntitlementCache::new(entitlement, revalidate, fetch_timeout),
            tabs: RefCell::new(TabManager::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    pub fn entitlement(&self) -> &EntitlementCache<E> {
        &self.entitlement
    }

    pub fn tab_state(&self, tab_id: TabId) -> TabState {
        self.tabs.borrow().state(tab_id)
    }

    pub fn record(&self, tab_id: TabId) -> Option<TabRecord> {
        self.tabs.borrow().record(tab_id)
    }

    pub fn tracked_tabs(&self) -> usize {
        self.tabs.borrow().tab_count()
    }

    pub fn is_toggle_in_flight(&self, tab_id: TabId) -> bool {
        self.tabs.borrow().is_in_flight(tab_id)
    }

    /// Whether `url` belongs to an origin that loads the instrumentation itself.
    pub fn is_local_origin(&self, url: &str) -> bool {
        self.settings
            .local_origins
            .iter()
            .any(|origin| url.starts_with(origin.as_str()))
    }

    /// Fetch the entitlement at startup so the first toggle does not wait on it.
    pub async fn refresh_entitlement(&self) -> bool {
        self.entitlement.refresh().await
    }

    /// "Paid" push from the payment flow.
    pub fn on_paid(&self) {
        self.entitlement.mark_paid();
    }

    /// Handle a user toggle for `tab_id`, currently showing `url`.
    ///
    /// Only injection failures and overlapping toggles are returned as errors;
    /// messaging failures resolve to conservative defaults.
    pub async fn toggle(&self, tab_id: TabId, url: &str) -> Result<ToggleOutcome, ToggleError> {
        self.tabs.borrow_mut().begin_toggle(tab_id)?;
        let _guard = ToggleGuard {
            tabs: &self.tabs,
            tab_id,
        };

        if self.check_presence(tab_id).await {
            if let Err(e) = self.send(tab_id, HudMessage::Destroy).await {
                debug!(tab_id, error = %e, "destroy not delivered");
            }
            let mut tabs = self.tabs.borrow_mut();
            tabs.mark_instrumented(tab_id);
            tabs.mark_hidden(tab_id);
            info!(tab_id, "hud hidden");
            return Ok(ToggleOutcome::Hidden);
        }

        let is_premium = self.entitlement.is_premium().await;
        let already_instrumented = self.tabs.borrow().is_instrumented(tab_id);
        let mut injected = false;

        if !already_instrumented && !self.is_local_origin(url) {
            if let Err(e) = self
                .injector
                .inject(tab_id, &self.settings.script_file)
                .await
            {
                warn!(tab_id, url, error = %e, "instrumentation injection failed");
                return Err(ToggleError::Injection(e));
            }
            self.tabs.borrow_mut().mark_instrumented(tab_id);
            injected = true;
            // A freshly injected script may not be listening yet.
            sleep(Duration::from_millis(self.settings.settle_delay_ms)).await;
        }

        match self.send(tab_id, HudMessage::Init { is_premium }).await {
            Ok(_) => {
                self.tabs.borrow_mut().mark_visible(tab_id);
                info!(tab_id, injected, is_premium, "hud shown");
                Ok(ToggleOutcome::Shown {
                    injected,
                    is_premium,
                })
            }
            Err(e) => {
                self.tabs.borrow_mut().clear_instrumented(tab_id);
                warn!(tab_id, error = %e, "init not delivered, will re-inject on next toggle");
                Ok(ToggleOutcome::InitFailed)
            }
        }
    }

    /// Tab closed.
    pub fn on_tab_removed(&self, tab_id: TabId) {
        self.tabs.borrow_mut().forget(tab_id);
        debug!(tab_id, "tab removed");
    }

    /// Tab started loading a new document; injected code is gone.
    pub fn on_navigation_start(&self, tab_id: TabId) {
        self.tabs.borrow_mut().reset(tab_id);
        debug!(tab_id, "navigation started");
    }

    /// The page tore its HUD down on its own.
    pub fn on_hud_closed(&self, tab_id: TabId) {
        self.tabs.borrow_mut().mark_hidden(tab_id);
        debug!(tab_id, "hud closed by page");
    }

    /// Handle a runtime message sent by a page. Returns the reply, if any.
    pub async fn handle_runtime_message(
        &self,
        sender: Option<TabId>,
        message: HudMessage,
    ) -> Option<Value> {
        match message {
            HudMessage::GetState => {
                let is_premium = self.entitlement.is_premium().await;
                serde_json::to_value(StateReply { is_premium }).ok()
            }
            HudMessage::HudClosed => {
                if let Some(tab_id) = sender {
                    self.on_hud_closed(tab_id);
                }
                None
            }
            HudMessage::OpenPayment => {
                self.entitlement.open_payment_page().await;
                None
            }
            other => {
                debug!(action = other.action(), "ignoring page-bound message");
                None
            }
        }
    }

    /// Presence check. Any failure reads as "not visible".
    async fn check_presence(&self, tab_id: TabId) -> bool {
        let limit = self.settings.presence_timeout_ms;
        match self.send_within(tab_id, HudMessage::Ping, limit).await {
            Ok(Some(reply)) => serde_json::from_value::<PingReply>(reply)
                .map(|r| r.active)
                .unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                debug!(tab_id, error = %e, "presence check failed");
                false
            }
        }
    }

    async fn send(&self, tab_id: TabId, message: HudMessage) -> Result<Option<Value>, MessagingError> {
        self.send_within(tab_id, message, self.settings.message_timeout_ms)
            .await
    }

    async fn send_within(
        &self,
        tab_id: TabId,
        message: HudMessage,
        limit_ms: u64,
    ) -> Result<Option<Value>, MessagingError> {
        match timeout(
            Duration::from_millis(limit_ms),
            self.messenger.send(tab_id, message),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MessagingError::Timeout(limit_ms)),
        }
    }
}
