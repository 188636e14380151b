//! In-page half of DevPulse.
//!
//! Answers the coordinator's `ping`, `init` and `destroy`, owns the sampling
//! engine for as long as the HUD is mounted, and restores a previously
//! visible HUD after a reload on local-development hosts.

use serde_json::Value;
use tracing::{debug, info};

use crate::services::local_store::LocalStore;
use crate::services::sampling_engine::{PagePlatform, SamplingEngine};
use crate::types::errors::MessagingError;
use crate::types::hud::{HudPosition, HudPreferences, KEY_ACTIVE, KEY_COLLAPSED, KEY_POSITION};
use crate::types::message::{HudMessage, PingReply, StateReply};
use crate::types::metrics::MetricsSnapshot;
use crate::types::settings::SamplingSettings;

/// Hosts whose pages load the instrumentation statically.
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Page → coordinator runtime channel.
#[allow(async_fn_in_trait)]
pub trait RuntimeLink {
    async fn send(&self, message: HudMessage) -> Result<Option<Value>, MessagingError>;
}

/// A mounted HUD and everything bound to its lifetime.
pub struct HudSession {
    pub is_premium: bool,
    pub engine: SamplingEngine,
    pub preferences: HudPreferences,
}

/// The instrumentation living inside one page.
pub struct HudAgent<S, L, P> {
    store: S,
    link: L,
    platform: P,
    sampling: SamplingSettings,
    session: Option<HudSession>,
}

pub fn is_local_host(hostname: &str) -> bool {
    LOCAL_HOSTS.contains(&hostname)
}

impl<S, L, P> HudAgent<S, L, P>
where
    S: LocalStore,
    L: RuntimeLink,
    P: PagePlatform,
{
    pub fn new(store: S, link: L, platform: P, sampling: SamplingSettings) -> Self {
        Self {
            store,
            link,
            platform,
            sampling,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&HudSession> {
        self.session.as_ref()
    }

    /// Mutable access for wiring platform observer callbacks into the engine.
    pub fn engine_mut(&mut self) -> Option<&mut SamplingEngine> {
        self.session.as_mut().map(|s| &mut s.engine)
    }

    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        self.session.as_ref().map(|s| s.engine.snapshot())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Drive the engine for one frame. No-op while unmounted.
    pub fn tick(&mut self, now_ms: f64) -> Option<&MetricsSnapshot> {
        let platform = &self.platform;
        self.session
            .as_mut()
            .map(|session| session.engine.tick(now_ms, platform))
    }

    /// Handle a coordinator message. Returns the reply, if any.
    pub async fn handle_message(&mut self, message: HudMessage) -> Option<Value> {
        match message {
            HudMessage::Ping => serde_json::to_value(PingReply {
                active: self.is_active(),
            })
            .ok(),
            HudMessage::Init { is_premium } => {
                self.create(is_premium);
                None
            }
            HudMessage::Destroy => {
                self.destroy().await;
                None
            }
            other => {
                debug!(action = other.action(), "ignoring coordinator-bound message");
                None
            }
        }
    }

    /// Mount the HUD. Safe to call while already mounted: the old session is
    /// replaced without notifying the coordinator.
    pub fn create(&mut self, is_premium: bool) {
        if self.session.take().is_some() {
            debug!("replacing mounted hud");
        }

        let mut engine = SamplingEngine::new(self.sampling.clone());
        engine.init_observers(&self.platform);

        let preferences = self.load_preferences();
        self.session = Some(HudSession {
            is_premium,
            engine,
            preferences,
        });

        if let Err(e) = self.store.set(KEY_ACTIVE, "true") {
            debug!(error = %e, "could not persist active flag");
        }
        info!(is_premium, "hud mounted");
    }

    /// Unmount the HUD and tell the coordinator. Delivery is best-effort.
    pub async fn destroy(&mut self) {
        self.session = None;

        if let Err(e) = self.store.remove(KEY_ACTIVE) {
            debug!(error = %e, "could not clear active flag");
        }

        if let Err(e) = self.link.send(HudMessage::HudClosed).await {
            debug!(error = %e, "hudClosed not delivered");
        }
        info!("hud unmounted");
    }

    /// Auto-restore on page load for local-development hosts.
    ///
    /// Returns `true` when the HUD was mounted again.
    pub async fn restore_on_load(&mut self, hostname: &str) -> bool {
        if !is_local_host(hostname) {
            return false;
        }
        let was_active = matches!(self.store.get(KEY_ACTIVE), Ok(Some(ref v)) if v == "true");
        if !was_active {
            return false;
        }

        match self.link.send(HudMessage::GetState).await {
            Ok(reply) => {
                let is_premium = reply
                    .and_then(|v| serde_json::from_value::<StateReply>(v).ok())
                    .map(|s| s.is_premium)
                    .unwrap_or(false);
                self.create(is_premium);
                true
            }
            Err(e) => {
                debug!(error = %e, "coordinator unreachable, dropping active flag");
                if let Err(e) = self.store.remove(KEY_ACTIVE) {
                    debug!(error = %e, "could not clear active flag");
                }
                false
            }
        }
    }

    /// Persist the overlay's position after a drag.
    pub fn set_position(&mut self, x: f64, y: f64) {
        let position = HudPosition { x, y };
        match serde_json::to_string(&position) {
            Ok(json) => {
                if let Err(e) = self.store.set(KEY_POSITION, &json) {
                    debug!(error = %e, "could not persist position");
                }
            }
            Err(e) => debug!(error = %e, "could not serialize position"),
        }
        if let Some(session) = self.session.as_mut() {
            session.preferences.position = Some(position);
        }
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        let value = if collapsed { "true" } else { "false" };
        if let Err(e) = self.store.set(KEY_COLLAPSED, value) {
            debug!(error = %e, "could not persist collapsed flag");
        }
        if let Some(session) = self.session.as_mut() {
            session.preferences.collapsed = collapsed;
        }
    }

    /// Saved preferences; unreadable entries fall back to defaults.
    pub fn load_preferences(&self) -> HudPreferences {
        let position = self
            .store
            .get(KEY_POSITION)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<HudPosition>(&raw).ok());
        let collapsed = matches!(self.store.get(KEY_COLLAPSED), Ok(Some(ref v)) if v == "true");
        HudPreferences {
            collapsed,
            position,
        }
    }
}
