use std::sync::Arc;

use boostbot::bot::Bot;
use boostbot::catalog::MemoryCatalog;
use boostbot::channels::{ChannelManager, CliChannel, TelegramChannel};
use boostbot::config::{BotConfig, ProviderConfig, TelegramConfig};
use boostbot::order::{
    HttpProviderClient, MemoryOrderStore, MemorySubmission, OrderSubmission,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: invalid configuration: {e}");
        std::process::exit(1);
    });

    eprintln!("🛒 BoostBot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Fee: ${} per order", config.fixed_fee);
    eprintln!(
        "   Retries: {} (base delay {:?})",
        config.retry_attempts, config.retry_base_delay
    );
    if config.operator_ids.is_empty() {
        eprintln!("   Operators: none configured");
    } else {
        eprintln!("   Operators: {}", config.operator_ids.join(", "));
    }

    // ── Catalog & order store ───────────────────────────────────────────
    let catalog = Arc::new(MemoryCatalog::seeded());
    let orders = Arc::new(MemoryOrderStore::new());

    // ── Fulfillment provider ────────────────────────────────────────────
    let submission: Arc<dyn OrderSubmission> = match ProviderConfig::from_env() {
        Some(provider) => {
            eprintln!("   Provider: {}", provider.api_url);
            Arc::new(HttpProviderClient::new(provider.api_url, provider.api_key))
        }
        None => {
            eprintln!("   Provider: none (orders accepted in memory)");
            Arc::new(MemorySubmission::new())
        }
    };

    // ── Channels ────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    let mut active_channels = vec!["cli"];

    // Always add CLI
    channels.add(Arc::new(CliChannel::new()));

    // Conditionally add Telegram if bot token is set
    if let Some(telegram) = TelegramConfig::from_env() {
        channels.add(Arc::new(TelegramChannel::new(telegram.bot_token)));
        active_channels.push("telegram");
    }

    eprintln!("   Channels: {}", active_channels.join(", "));
    eprintln!("   Type a message and press Enter. /start begins an order.\n");

    // ── Run ─────────────────────────────────────────────────────────────
    let bot = Bot::new(config, catalog, submission, orders, channels);
    bot.run().await?;

    Ok(())
}
