//! ChannelManager — merges channel streams and routes responses back.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ChannelError;

use super::channel::{Channel, IncomingMessage, MessageStream, OutgoingResponse};

/// Owns every active channel, keyed by name.
#[derive(Default)]
pub struct ChannelManager {
    channels: HashMap<String, Arc<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Arc<dyn Channel>) {
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    /// Start every channel and merge their inbound streams into one.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in self.channels.values() {
            streams.push(channel.start().await?);
        }
        Ok(Box::pin(futures::stream::select_all(streams)))
    }

    /// Route a response back to the channel the message arrived on.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .get(&msg.channel)
            .ok_or_else(|| ChannelError::UnknownChannel(msg.channel.clone()))?;
        channel.respond(msg, response).await
    }

    /// Deliver an operator notice to every recipient on every channel.
    /// Failures are logged, not propagated; notices are best-effort.
    pub async fn notify_operators(&self, recipients: &[String], text: &str) {
        for channel in self.channels.values() {
            for recipient in recipients {
                if let Err(e) = channel.notify(recipient, text).await {
                    tracing::warn!(
                        channel = channel.name(),
                        recipient,
                        error = %e,
                        "Operator notice failed"
                    );
                }
            }
        }
    }

    pub async fn shutdown_all(&self) {
        for channel in self.channels.values() {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), error = %e, "Channel shutdown failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;

    struct RecordingChannel {
        name: &'static str,
        sent: Mutex<Vec<OutgoingResponse>>,
        notices: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChannel {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                sent: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent.lock().await.push(response);
            Ok(())
        }

        async fn notify(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
            self.notices
                .lock()
                .await
                .push((recipient.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn respond_routes_by_channel_name() {
        let cli = Arc::new(RecordingChannel::new("cli"));
        let tg = Arc::new(RecordingChannel::new("telegram"));
        let mut manager = ChannelManager::new();
        manager.add(cli.clone());
        manager.add(tg.clone());

        let msg = IncomingMessage::text("telegram", "u1", "hi");
        manager
            .respond(&msg, OutgoingResponse::text("hello"))
            .await
            .unwrap();

        assert!(cli.sent.lock().await.is_empty());
        assert_eq!(tg.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn respond_to_unknown_channel_fails() {
        let manager = ChannelManager::new();
        let msg = IncomingMessage::text("nowhere", "u1", "hi");
        let err = manager
            .respond(&msg, OutgoingResponse::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(_)));
    }

    #[tokio::test]
    async fn operator_notices_fan_out() {
        let cli = Arc::new(RecordingChannel::new("cli"));
        let mut manager = ChannelManager::new();
        manager.add(cli.clone());

        manager
            .notify_operators(&["op1".to_string(), "op2".to_string()], "new order")
            .await;

        let notices = cli.notices.lock().await;
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], ("op1".to_string(), "new order".to_string()));
    }
}
