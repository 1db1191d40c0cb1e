//! Session state — one tagged variant per conversation phase.
//!
//! Each variant carries exactly the fields that are meaningful in that
//! phase, so a draft can never outlive its service selection and there are
//! no half-populated sessions.

use serde::{Deserialize, Serialize};

use crate::catalog::Service;
use crate::order::OrderDraft;

use super::event::EditField;

/// Where a conversation currently stands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum ConversationState {
    /// Nothing chosen yet; the platform menu is (or should be) showing.
    #[default]
    Idle,
    /// Platform picked; the service menu is showing.
    PlatformChosen { platform: String },
    /// Service picked; waiting for the target handle.
    ServiceChosen { service: Service },
    /// Target stored; waiting for a quantity, or for comment texts when the
    /// service collects comments.
    AwaitingAmount { service: Service, target: String },
    /// Draft built and priced; waiting for edit/confirm/cancel.
    SummaryReady { draft: OrderDraft },
    /// One summary field is being re-entered.
    Editing { field: EditField, draft: OrderDraft },
}

impl ConversationState {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PlatformChosen { .. } => "platform_chosen",
            Self::ServiceChosen { .. } => "service_chosen",
            Self::AwaitingAmount { .. } => "awaiting_amount",
            Self::SummaryReady { .. } => "summary_ready",
            Self::Editing { .. } => "editing",
        }
    }

    /// The platform in effect, if any phase has committed one.
    pub fn platform(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::PlatformChosen { platform } => Some(platform),
            Self::ServiceChosen { service } => Some(&service.platform),
            Self::AwaitingAmount { service, .. } => Some(&service.platform),
            Self::SummaryReady { draft } | Self::Editing { draft, .. } => Some(&draft.platform),
        }
    }
}

/// One user's conversation. Created on their first event, reset on
/// restart, cancel, and confirm.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub state: ConversationState,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: ConversationState::Idle,
        }
    }

    /// Drop everything and return to the start of the conversation.
    pub fn reset(&mut self) {
        self.state = ConversationState::Idle;
    }
}
