//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// How an inbound event was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A tap on one of the actions offered with a previous response.
    MenuSelection,
    /// Free-form text typed by the user.
    FreeText,
}

/// An inbound event from a user.
///
/// For menu selections `content` is the action id; for free text it is the
/// raw text.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub channel: String,
    pub user_id: String,
    pub kind: MessageKind,
    pub content: String,
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn text(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            kind: MessageKind::FreeText,
            content: text.into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn menu(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        action_id: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            kind: MessageKind::MenuSelection,
            content: action_id.into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One action offered with a response: a label for the user and an opaque id
/// that comes back as a menu selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub id: String,
}

impl Action {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

/// An outbound response: text plus the ordered actions currently available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub text: String,
    pub actions: Vec<Action>,
}

impl OutgoingResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }
}

/// Stream of inbound messages produced by a running channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A transport that delivers user events in and responses out.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start listening and return the inbound message stream.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a response to the user who sent `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Deliver an out-of-band notice to a recipient id on this channel.
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        let _ = (recipient, text);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
