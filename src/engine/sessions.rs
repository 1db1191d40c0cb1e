//! Session routing — one worker task per user identity.
//!
//! Each user's events go through a dedicated FIFO queue, so a session never
//! processes two events at once and events apply in arrival order. Distinct
//! users run fully in parallel. Workers exit after an idle timeout and are
//! respawned transparently on the next event.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::channels::{ChannelManager, IncomingMessage};
use crate::config::BotConfig;

use super::engine::ConversationEngine;
use super::event::SessionEvent;
use super::state::Session;

/// Per-session queue depth. Events past this while a session is busy are
/// dropped with a warning rather than stalling other users.
const SESSION_QUEUE_DEPTH: usize = 32;

/// Routes inbound messages to per-user session workers.
pub struct SessionRouter {
    engine: Arc<ConversationEngine>,
    channels: Arc<ChannelManager>,
    workers: tokio::sync::Mutex<HashMap<String, mpsc::Sender<IncomingMessage>>>,
    idle_timeout: Duration,
    operator_ids: Vec<String>,
}

impl SessionRouter {
    pub fn new(
        engine: Arc<ConversationEngine>,
        channels: Arc<ChannelManager>,
        config: &BotConfig,
    ) -> Self {
        Self {
            engine,
            channels,
            workers: tokio::sync::Mutex::new(HashMap::new()),
            idle_timeout: config.session_idle_timeout,
            operator_ids: config.operator_ids.clone(),
        }
    }

    /// Enqueue a message for its user's session worker, spawning or
    /// respawning the worker as needed.
    pub async fn dispatch(&self, msg: IncomingMessage) {
        let user_id = msg.user_id.clone();
        let mut workers = self.workers.lock().await;

        let msg = match workers.get(&user_id) {
            Some(tx) => match tx.try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(user = %user_id, "Session queue full; dropping event");
                    return;
                }
                // Worker idled out; fall through and respawn.
                Err(TrySendError::Closed(msg)) => msg,
            },
            None => msg,
        };

        let tx = self.spawn_worker(user_id.clone());
        if tx.try_send(msg).is_err() {
            tracing::warn!(user = %user_id, "Freshly spawned session worker rejected event");
        }
        workers.insert(user_id, tx);
    }

    fn spawn_worker(&self, user_id: String) -> mpsc::Sender<IncomingMessage> {
        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(SESSION_QUEUE_DEPTH);
        let engine = Arc::clone(&self.engine);
        let channels = Arc::clone(&self.channels);
        let operator_ids = self.operator_ids.clone();
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            let mut session = Session::new(user_id.clone());
            tracing::debug!(user = %user_id, "Session worker started");

            loop {
                let msg = match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(msg)) => msg,
                    Ok(None) => break,
                    Err(_) => {
                        tracing::debug!(user = %user_id, "Session idle; worker exiting");
                        break;
                    }
                };

                let Some(event) = SessionEvent::parse(&msg) else {
                    tracing::warn!(
                        user = %user_id,
                        payload = %msg.content,
                        "Unrecognized menu payload; ignoring"
                    );
                    continue;
                };

                let reply = engine.handle(&mut session, event).await;
                let notice = reply.operator_notice.clone();
                if let Err(e) = channels.respond(&msg, reply.into()).await {
                    tracing::warn!(user = %user_id, error = %e, "Failed to deliver response");
                }
                if let Some(notice) = notice {
                    channels.notify_operators(&operator_ids, &notice).await;
                }
            }
        });

        tx
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::catalog::MemoryCatalog;
    use crate::channels::{Channel, MessageStream, OutgoingResponse};
    use crate::error::ChannelError;
    use crate::order::{MemoryOrderStore, MemorySubmission};

    use super::*;

    struct RecordingChannel {
        sent: Mutex<Vec<(String, OutgoingResponse)>>,
        notices: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            "test"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn respond(
            &self,
            msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .await
                .push((msg.user_id.clone(), response));
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

    fn router(
        config: BotConfig,
    ) -> (Arc<SessionRouter>, Arc<RecordingChannel>, Arc<MemorySubmission>) {
        let channel = Arc::new(RecordingChannel::new());
        let mut manager = ChannelManager::new();
        manager.add(channel.clone());
        let channels = Arc::new(manager);

        let submission = Arc::new(MemorySubmission::new());
        let engine = Arc::new(ConversationEngine::new(
            Arc::new(MemoryCatalog::seeded()),
            submission.clone(),
            Arc::new(MemoryOrderStore::new()),
            config.clone(),
        ));
        (
            Arc::new(SessionRouter::new(engine, channels, &config)),
            channel,
            submission,
        )
    }

    async fn wait_for_responses(channel: &RecordingChannel, count: usize) {
        for _ in 0..200 {
            if channel.sent.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {count} responses");
    }

    #[tokio::test]
    async fn events_for_one_user_apply_in_order() {
        let (router, channel, _) = router(BotConfig {
            retry_attempts: 0,
            retry_base_delay: Duration::ZERO,
            ..BotConfig::default()
        });

        router
            .dispatch(IncomingMessage::text("test", "u1", "/start"))
            .await;
        router
            .dispatch(IncomingMessage::menu("test", "u1", "platform:instagram"))
            .await;
        wait_for_responses(&channel, 2).await;

        let sent = channel.sent.lock().await;
        assert!(sent[0].1.text.starts_with("Welcome!"));
        assert!(sent[1].1.text.starts_with("Platform selected: instagram"));
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let (router, channel, _) = router(BotConfig::default());

        router
            .dispatch(IncomingMessage::text("test", "alice", "/start"))
            .await;
        router
            .dispatch(IncomingMessage::text("test", "bob", "hello"))
            .await;
        wait_for_responses(&channel, 2).await;

        let sent = channel.sent.lock().await;
        let bob = sent.iter().find(|(user, _)| user == "bob").unwrap();
        // Bob never started, so his free text gets the idle hint.
        assert_eq!(bob.1.text, "Welcome! Send /start to begin.");
    }

    #[tokio::test]
    async fn unknown_payloads_are_ignored() {
        let (router, channel, _) = router(BotConfig::default());

        router
            .dispatch(IncomingMessage::menu("test", "u1", "format:c"))
            .await;
        router
            .dispatch(IncomingMessage::text("test", "u1", "/start"))
            .await;
        wait_for_responses(&channel, 1).await;

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.text.starts_with("Welcome!"));
    }

    #[tokio::test]
    async fn worker_respawns_after_queue_closes() {
        let (router, channel, _) = router(BotConfig::default());

        router
            .dispatch(IncomingMessage::text("test", "u1", "/start"))
            .await;
        wait_for_responses(&channel, 1).await;

        // Simulate an idled-out worker by closing its queue.
        {
            let mut workers = router.workers.lock().await;
            let (closed_tx, _) = mpsc::channel(1);
            workers.insert("u1".into(), closed_tx);
        }

        router
            .dispatch(IncomingMessage::text("test", "u1", "/start"))
            .await;
        wait_for_responses(&channel, 2).await;
    }
}
