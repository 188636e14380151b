use serde::{Deserialize, Serialize};

/// Runtime messages exchanged between the coordinator and instrumented pages.
///
/// Serialized the way the extension runtime carries them: an object tagged by
/// `"action"`, e.g. `{"action":"init","isPremium":true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HudMessage {
    /// coordinator → page: "are you alive and visible".
    Ping,
    /// coordinator → page: mount the HUD.
    Init {
        #[serde(rename = "isPremium", default)]
        is_premium: bool,
    },
    /// coordinator → page: tear the HUD down.
    Destroy,
    /// page → coordinator: ask for the current entitlement.
    GetState,
    /// page → coordinator: the HUD tore itself down.
    HudClosed,
    /// page → coordinator: open the entitlement UI.
    OpenPayment,
}

impl HudMessage {
    /// The wire name of this message kind.
    pub fn action(&self) -> &'static str {
        match self {
            HudMessage::Ping => "ping",
            HudMessage::Init { .. } => "init",
            HudMessage::Destroy => "destroy",
            HudMessage::GetState => "getState",
            HudMessage::HudClosed => "hudClosed",
            HudMessage::OpenPayment => "openPayment",
        }
    }

    /// Whether this message is addressed to a page (as opposed to the coordinator).
    pub fn is_page_bound(&self) -> bool {
        matches!(
            self,
            HudMessage::Ping | HudMessage::Init { .. } | HudMessage::Destroy
        )
    }
}

/// Reply to [`HudMessage::Ping`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    #[serde(default)]
    pub active: bool,
}

/// Reply to [`HudMessage::GetState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReply {
    #[serde(rename = "isPremium", default)]
    pub is_premium: bool,
}
