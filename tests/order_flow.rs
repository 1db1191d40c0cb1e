//! End-to-end order flows through the full bot loop.
//!
//! A scripted channel feeds events into `Bot::run` and records every
//! response, so these tests exercise the same path as a real transport:
//! channel stream, session router, engine, and back out through the channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use boostbot::bot::Bot;
use boostbot::catalog::MemoryCatalog;
use boostbot::channels::{
    Channel, ChannelManager, IncomingMessage, MessageStream, OutgoingResponse,
};
use boostbot::config::BotConfig;
use boostbot::error::ChannelError;
use boostbot::order::{MemoryOrderStore, MemorySubmission, OrderStore};

/// Channel fed by the test through an mpsc queue; responses and notices are
/// recorded for assertions.
struct ScriptedChannel {
    incoming: Mutex<Option<mpsc::UnboundedReceiver<IncomingMessage>>>,
    sent: Arc<Mutex<Vec<(String, OutgoingResponse)>>>,
    notices: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedChannel {
    fn new(rx: mpsc::UnboundedReceiver<IncomingMessage>) -> Self {
        Self {
            incoming: Mutex::new(Some(rx)),
            sent: Arc::new(Mutex::new(Vec::new())),
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let rx = self
            .incoming
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: "scripted".into(),
                reason: "already started".into(),
            })?;
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });
        Ok(Box::pin(stream))
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

struct TestBot {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    sent: Arc<Mutex<Vec<(String, OutgoingResponse)>>>,
    notices: Arc<Mutex<Vec<(String, String)>>>,
    submission: Arc<MemorySubmission>,
    orders: Arc<MemoryOrderStore>,
}

impl TestBot {
    fn spawn(config: BotConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(ScriptedChannel::new(rx));
        let sent = Arc::clone(&channel.sent);
        let notices = Arc::clone(&channel.notices);

        let mut channels = ChannelManager::new();
        channels.add(channel);

        let submission = Arc::new(MemorySubmission::new());
        let orders = Arc::new(MemoryOrderStore::new());
        let bot = Bot::new(
            config,
            Arc::new(MemoryCatalog::seeded()),
            submission.clone(),
            orders.clone(),
            channels,
        );
        tokio::spawn(async move {
            let _ = bot.run().await;
        });

        Self {
            tx,
            sent,
            notices,
            submission,
            orders,
        }
    }

    fn send_text(&self, user: &str, text: &str) {
        self.tx
            .send(IncomingMessage::text("scripted", user, text))
            .expect("bot loop alive");
    }

    fn send_menu(&self, user: &str, action_id: &str) {
        self.tx
            .send(IncomingMessage::menu("scripted", user, action_id))
            .expect("bot loop alive");
    }

    /// Wait until `count` responses have been recorded and return the last.
    async fn wait_for_response(&self, count: usize) -> OutgoingResponse {
        for _ in 0..400 {
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent[count - 1].1.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for response #{count}");
    }

    /// Tap the offered action whose label matches, as a real client would.
    async fn tap(&self, user: &str, after: usize, label: &str) {
        let response = self.wait_for_response(after).await;
        let action = response
            .actions
            .iter()
            .find(|a| a.label == label)
            .unwrap_or_else(|| panic!("no action labeled {label:?} in {:?}", response.actions));
        self.send_menu(user, &action.id);
    }
}

fn fast_config() -> BotConfig {
    BotConfig {
        retry_attempts: 0,
        retry_base_delay: Duration::ZERO,
        operator_ids: vec!["op1".into()],
        ..BotConfig::default()
    }
}

#[tokio::test]
async fn follower_order_end_to_end() {
    let bot = TestBot::spawn(fast_config());
    let user = "431293700";

    bot.send_text(user, "/start");
    bot.tap(user, 1, "Instagram").await;
    bot.tap(user, 2, "Followers").await;

    let prompt = bot.wait_for_response(3).await;
    assert!(prompt.text.contains("Please enter your target username"));

    bot.send_text(user, "@someuser");
    let prompt = bot.wait_for_response(4).await;
    assert_eq!(prompt.text, "Please enter the quantity you want:");

    bot.send_text(user, "250");
    let summary = bot.wait_for_response(5).await;
    assert!(summary.text.contains("Quantity: 250"));
    assert!(summary.text.contains("Base Price: $9.00"));
    assert!(summary.text.contains("Total: $9.50"));

    bot.tap(user, 5, "Confirm ✅").await;
    let confirmed = bot.wait_for_response(6).await;
    assert!(confirmed.text.contains("Order confirmed!"));

    let submitted = bot.submission.submitted().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].target, "someuser");
    assert_eq!(bot.orders.recent(10).await.unwrap().len(), 1);

    // Operators hear about the confirmed order.
    let notices = bot.notices.lock().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, "op1");
    assert!(notices[0].1.contains("@someuser"));
}

#[tokio::test]
async fn comment_order_with_validation_retry_and_edit() {
    let bot = TestBot::spawn(fast_config());
    let user = "u2";

    bot.send_text(user, "/start");
    bot.tap(user, 1, "Tiktok").await;
    bot.tap(user, 2, "Comments").await;
    bot.wait_for_response(3).await;

    bot.send_text(user, "someuser");
    let prompt = bot.wait_for_response(4).await;
    assert!(prompt.text.contains("separated by commas"));

    // An empty comment list is rejected; the session stays put.
    bot.send_text(user, " , ,");
    let rejected = bot.wait_for_response(5).await;
    assert_eq!(rejected.text, "Enter at least 1, at most 500 comments.");

    // Retrying with valid input succeeds without redoing earlier steps.
    bot.send_text(user, "Nice!, Cool!, Wow!");
    let summary = bot.wait_for_response(6).await;
    assert!(summary.text.contains("Comments: 3"));
    assert!(summary.text.contains("Total: $10.50"));

    // Edit the username in place; prices stay as they were.
    bot.tap(user, 6, "Edit Username").await;
    bot.wait_for_response(7).await;
    bot.send_text(user, "@renamed");
    let summary = bot.wait_for_response(8).await;
    assert!(summary.text.contains("Username: @renamed"));
    assert!(summary.text.contains("Total: $10.50"));

    bot.tap(user, 8, "Confirm ✅").await;
    let confirmed = bot.wait_for_response(9).await;
    assert!(confirmed.text.contains("Order confirmed!"));

    let submitted = bot.submission.submitted().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].target, "renamed");
}

#[tokio::test]
async fn cancel_leaves_nothing_behind() {
    let bot = TestBot::spawn(fast_config());
    let user = "u3";

    bot.send_text(user, "/start");
    bot.tap(user, 1, "Youtube").await;
    bot.tap(user, 2, "Views").await;
    bot.wait_for_response(3).await;
    bot.send_text(user, "channelname");
    bot.wait_for_response(4).await;
    bot.send_text(user, "1000");
    let summary = bot.wait_for_response(5).await;
    assert!(summary.text.contains("Quantity: 1000"));

    bot.tap(user, 5, "Cancel ❌").await;
    let cancelled = bot.wait_for_response(6).await;
    assert_eq!(
        cancelled.text,
        "Order cancelled. You can start a new one with /start"
    );

    assert!(bot.submission.submitted().await.is_empty());
    assert!(bot.orders.recent(10).await.unwrap().is_empty());
    assert!(bot.notices.lock().await.is_empty());
}

#[tokio::test]
async fn two_users_order_independently() {
    let bot = TestBot::spawn(fast_config());

    bot.send_text("alice", "/start");
    bot.send_text("bob", "/start");

    // Both get a platform menu, in whichever order the router scheduled.
    let mut users = Vec::new();
    for n in [1, 2] {
        let _ = bot.wait_for_response(n).await;
    }
    {
        let sent = bot.sent.lock().await;
        for (user, response) in sent.iter() {
            assert!(response.text.starts_with("Welcome!"));
            users.push(user.clone());
        }
    }
    users.sort();
    assert_eq!(users, vec!["alice", "bob"]);
}
