//! Session events — parses inbound messages into engine input.
//!
//! Menu action ids are the inverse of the builders in `reply`; a tap on an
//! offered button comes back here as the same id string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ServiceId;
use crate::channels::{IncomingMessage, MessageKind};

/// A draft field the user can edit from the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditField {
    Target,
    Quantity,
    Comments,
}

impl std::fmt::Display for EditField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Target => "target",
            Self::Quantity => "quantity",
            Self::Comments => "comments",
        };
        write!(f, "{s}")
    }
}

/// One inbound event against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Restart the conversation from the top.
    Start,
    SelectPlatform(String),
    SelectService(ServiceId),
    BackToPlatforms,
    BackToServices,
    BackToSummary,
    Edit(EditField),
    Confirm,
    Cancel,
    /// Free text: a target handle, a quantity, or a comment list depending
    /// on the current state.
    Text(String),
}

impl SessionEvent {
    /// Parse an inbound message. Returns `None` for menu payloads this build
    /// does not recognize (stale or forged buttons).
    pub fn parse(msg: &IncomingMessage) -> Option<Self> {
        match msg.kind {
            MessageKind::FreeText => {
                let trimmed = msg.content.trim();
                match trimmed.to_lowercase().as_str() {
                    "/start" | "/restart" => Some(Self::Start),
                    "/cancel" => Some(Self::Cancel),
                    _ => Some(Self::Text(msg.content.clone())),
                }
            }
            MessageKind::MenuSelection => Self::parse_action(msg.content.trim()),
        }
    }

    fn parse_action(action: &str) -> Option<Self> {
        if let Some(name) = action.strip_prefix("platform:") {
            return Some(Self::SelectPlatform(name.to_string()));
        }
        if let Some(raw) = action.strip_prefix("service:") {
            return Uuid::parse_str(raw).ok().map(Self::SelectService);
        }
        match action {
            "back:platforms" => Some(Self::BackToPlatforms),
            "back:services" => Some(Self::BackToServices),
            "back:summary" => Some(Self::BackToSummary),
            "edit:target" => Some(Self::Edit(EditField::Target)),
            "edit:quantity" => Some(Self::Edit(EditField::Quantity)),
            "edit:comments" => Some(Self::Edit(EditField::Comments)),
            "confirm" => Some(Self::Confirm),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}
