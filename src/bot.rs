//! Bot — wires channels to the session router and runs the main loop.

use std::sync::Arc;

use futures::StreamExt;

use crate::catalog::Catalog;
use crate::channels::ChannelManager;
use crate::config::BotConfig;
use crate::engine::{ConversationEngine, SessionRouter};
use crate::error::Result;
use crate::order::{OrderStore, OrderSubmission};

/// The assembled storefront bot.
pub struct Bot {
    channels: Arc<ChannelManager>,
    router: SessionRouter,
}

impl Bot {
    pub fn new(
        config: BotConfig,
        catalog: Arc<dyn Catalog>,
        submission: Arc<dyn OrderSubmission>,
        orders: Arc<dyn OrderStore>,
        channels: ChannelManager,
    ) -> Self {
        let channels = Arc::new(channels);
        let engine = Arc::new(ConversationEngine::new(
            catalog,
            submission,
            orders,
            config.clone(),
        ));
        let router = SessionRouter::new(engine, Arc::clone(&channels), &config);
        Self { channels, router }
    }

    /// Consume inbound events until every channel stream ends.
    pub async fn run(&self) -> Result<()> {
        let mut stream = self.channels.start_all().await?;

        while let Some(msg) = stream.next().await {
            tracing::debug!(
                channel = %msg.channel,
                user = %msg.user_id,
                kind = ?msg.kind,
                "Inbound event"
            );
            self.router.dispatch(msg).await;
        }

        self.channels.shutdown_all().await;
        Ok(())
    }
}
