/// Scoreline ingest: one run
///
/// Co dělá:
///   1. Načte HTML snapshot výpisu zápasů (soubor, nebo INGEST_SOURCE_URL)
///   2. Vytáhne zápasy + ligy (primary tier, fallback když nic)
///   3. Volitelně stáhne loga týmů do IMAGE_CACHE_DIR
///   4. Upsert do SQLite (MATCH_DB_PATH), ligy a týmy normalizované
///
/// Spuštění:
///   cargo run --bin ingest

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::EventLogger;
use match_extractor::MatchExtractor;
use match_store::MatchStore;
use scoreline_ingest::config::IngestConfig;
use scoreline_ingest::init_tracing;
use site_client::{localize_logos, DiskImageCache, SiteClient};
use std::env;
use std::fs::File;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cfg = IngestConfig::from_env();
    info!("=== Scoreline ingest ===");
    info!("DB: {}", cfg.db_path.display());
    info!("Logs: {}", cfg.log_dir.display());

    // Single instance lock
    let lock_file_path = env::temp_dir().join("scoreline_ingest.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another ingest run is already in progress! Exiting.");
            return Ok(());
        }
    };

    let logger = EventLogger::new(&cfg.log_dir);
    let extractor = MatchExtractor::new(cfg.extractor_options(), logger.clone())?;

    let mut outcome = match &cfg.source_url {
        Some(url) => match SiteClient::new().fetch_page(url).await {
            Ok(html) => extractor.extract_document(url, &html),
            Err(e) => extractor.report_unreadable(url, &e),
        },
        None => extractor.extract_file(&cfg.html_path),
    };

    if let Some(err) = &outcome.read_error {
        anyhow::bail!("no document to extract: {err}");
    }
    if outcome.used_fallback() && outcome.count() > 0 {
        warn!("Listing markup changed shape; {} rows found by the fallback pass", outcome.count());
    }
    if outcome.records.is_empty() {
        warn!("No matches found in {}", outcome.source);
        return Ok(());
    }

    if let Some(dir) = &cfg.image_cache_dir {
        let cache = DiskImageCache::new(dir);
        let replaced = localize_logos(&mut outcome.records, &cache).await;
        info!("Localized {} team logos into {}", replaced, dir.display());
    }

    let records = outcome.records;
    let db_path = cfg.db_path.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut store = MatchStore::open(&db_path)?.with_logger(logger);
        Ok(store.upsert_batch(&records))
    })
    .await
    .context("store task panicked")??;

    info!("Done: {}", report);
    Ok(())
}
