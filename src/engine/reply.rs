//! Reply descriptor and the action builders for each menu.
//!
//! Action ids built here are parsed back by `SessionEvent::parse` when the
//! user taps the button.

use crate::catalog::{Platform, Service};
use crate::channels::{Action, OutgoingResponse};
use crate::order::{Amount, OrderDraft};

/// What the engine wants said back to the user, plus an optional
/// out-of-band notice for the operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<Action>,
    pub operator_notice: Option<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_operator_notice(mut self, notice: impl Into<String>) -> Self {
        self.operator_notice = Some(notice.into());
        self
    }
}

impl From<Reply> for OutgoingResponse {
    fn from(reply: Reply) -> Self {
        OutgoingResponse {
            text: reply.text,
            actions: reply.actions,
        }
    }
}

// ── Action builders ─────────────────────────────────────────────────

pub fn platform_actions(platforms: &[Platform]) -> Vec<Action> {
    platforms
        .iter()
        .map(|p| Action::new(p.label(), format!("platform:{}", p.name)))
        .collect()
}

pub fn service_actions(services: &[Service]) -> Vec<Action> {
    let mut actions: Vec<Action> = services
        .iter()
        .map(|s| Action::new(s.display_name.clone(), format!("service:{}", s.id)))
        .collect();
    actions.push(back_to_platforms());
    actions
}

pub fn back_to_platforms() -> Action {
    Action::new("⬅️ Back", "back:platforms")
}

pub fn back_to_services() -> Action {
    Action::new("⬅️ Back", "back:services")
}

pub fn back_to_summary() -> Action {
    Action::new("⬅️ Back", "back:summary")
}

/// The summary menu: which fields are editable depends on the service kind.
pub fn summary_actions(draft: &OrderDraft) -> Vec<Action> {
    let edit_amount = match draft.amount {
        Amount::Comments(_) => Action::new("Edit Comments", "edit:comments"),
        Amount::Quantity(_) => Action::new("Edit Quantity", "edit:quantity"),
    };
    vec![
        Action::new("Edit Username", "edit:target"),
        edit_amount,
        Action::new("Confirm ✅", "confirm"),
        Action::new("Cancel ❌", "cancel"),
        back_to_services(),
    ]
}
