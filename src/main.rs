use std::sync::Arc;

use profile_bot::channels::TelegramChannel;
use profile_bot::config::BotConfig;
use profile_bot::dispatcher::Dispatcher;
use profile_bot::registration::{RegistrationFlow, spawn_eviction_task};
use profile_bot::store::SqliteProfileStore;

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
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    eprintln!("🤖 Profile Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!(
        "   Session TTL: {} min\n",
        config.session_ttl.as_secs() / 60
    );

    // ── Store ───────────────────────────────────────────────────────────
    let store = Arc::new(SqliteProfileStore::open(&config.db_path).unwrap_or_else(|e| {
        eprintln!(
            "Error: Failed to open database at {}: {e}",
            config.db_path.display()
        );
        std::process::exit(1);
    }));

    // ── Registration flow ───────────────────────────────────────────────
    let flow = Arc::new(RegistrationFlow::new(store));
    let _eviction_handle = spawn_eviction_task(Arc::clone(&flow), config.session_ttl);

    // ── Telegram channel ────────────────────────────────────────────────
    let channel = Arc::new(TelegramChannel::new(
        config.bot_token.clone(),
        config.poll_timeout_secs,
    ));
    channel.health_check().await?;

    let dispatcher = Arc::new(Dispatcher::new(flow, channel));
    dispatcher.run().await?;

    Ok(())
}
