//! ttl_cache demo
//!
//! Walks a cache through its lifecycle: a value is stored with a short TTL,
//! read back, hidden once expired, then reclaimed by the janitor.

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{Ttl, TtlCache};

const CLEANUP_INTERVAL: Duration = Duration::from_millis(100);
const ENTRY_TTL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "debug" for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cache = TtlCache::new(CLEANUP_INTERVAL)?;
    info!("Cache created with cleanup interval {:?}", CLEANUP_INTERVAL);

    cache.set("a", 42, ENTRY_TTL);
    cache.set("pinned", 7, Ttl::Never);
    info!("get(a) right after set: {:?}", cache.get_value("a"));

    tokio::time::sleep(Duration::from_millis(60)).await;
    info!(
        "get(a) after {:?}: {:?} (resident: {})",
        ENTRY_TTL,
        cache.get_value("a"),
        cache.is_resident("a")
    );

    tokio::time::sleep(CLEANUP_INTERVAL).await;
    info!(
        "After one sweep: resident(a) = {}, get(pinned) = {:?}",
        cache.is_resident("a"),
        cache.get_value("pinned")
    );

    cache.shutdown().await;
    info!("Janitor state: {:?}", cache.janitor_state());

    println!("{}", serde_json::to_string_pretty(&cache.stats())?);
    Ok(())
}
