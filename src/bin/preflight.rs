use slmobi::infra::{logging, AppConfig, HttpFetcher, StorageBackend};
use slmobi::storage::{CatalogStore, PgStore};
use slmobi::Extractor;
use std::sync::Arc;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--scrape <url>]\n\
         \n\
         Requires env vars:\n\
           ADMIN_PASSWORD, and DATABASE_URL unless STORAGE_BACKEND=memory\n\
         Optional:\n\
           --scrape <url>   fetch a spec page and print the extracted record\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let scrape_url = match args.iter().position(|a| a == "--scrape") {
        Some(i) => match args.get(i + 1) {
            Some(url) => Some(url.clone()),
            None => usage_and_exit(),
        },
        None => None,
    };

    // Force-read config (nice error messages if missing)
    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  STORAGE_BACKEND={:?}", config.storage_backend);
    println!("  BIND_ADDR={}", config.bind_addr);
    println!("  IMAGE_DIR={}", config.image_dir.display());
    println!("  SESSION_TTL_SECS={}", config.session_ttl.as_secs());
    println!("  PENDING_PAGE_SIZE={}", config.pending_page_size);
    println!("  DUPLICATE_MATCH={:?}", config.duplicate_match);

    if config.storage_backend == StorageBackend::Postgres {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let store = PgStore::connect(url, 1).await?;
        store.ping().await?;
        let phones: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phones")
            .fetch_one(store.pool())
            .await?;
        println!("  Database reachable; schema ready ({} phones).", phones);
    }

    tokio::fs::create_dir_all(&config.image_dir).await?;
    println!("  Image directory is ready.");

    if let Some(url) = scrape_url {
        let extractor = Extractor::new(Arc::new(HttpFetcher::new(config.fetch_timeout)?));
        let record = extractor.extract(&url).await?;
        println!("> Scrape preview for {}:", url);
        println!("{}", serde_json::to_string_pretty(&record)?);
        let missing: Vec<&str> = record.missing().iter().map(|f| f.as_str()).collect();
        if !missing.is_empty() {
            println!("  Missing fields: {}", missing.join(", "));
        }
    }

    println!("> Preflight OK");
    Ok(())
}
