use anyhow::{Context, Result};
use chrono::Local;
use dotenv::dotenv;
use match_store::MatchStore;
use scoreline_ingest::config::ExportConfig;
use scoreline_ingest::export::{default_output_path, match_export, summary_export};
use scoreline_ingest::init_tracing;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cfg = ExportConfig::from_env()?;
    let store = MatchStore::open(&cfg.db_path)
        .with_context(|| format!("open db at {}", cfg.db_path.display()))?;
    let now = Local::now();

    let out = cfg
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_path(cfg.status, cfg.summary, now)));

    let json = if cfg.summary {
        let matches = store.all_matches()?;
        let doc = summary_export(&matches, store.count_matches()?, now);
        serde_json::to_string_pretty(&doc)?
    } else {
        let matches = match cfg.status {
            Some(status) => store.matches_by_status(status)?,
            None => store.all_matches()?,
        };
        info!(
            "Exporting {} matches ({})",
            matches.len(),
            cfg.status.map_or_else(|| "all".to_string(), |s| s.to_string())
        );
        serde_json::to_string_pretty(&match_export(&matches, cfg.status, now))?
    };

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&out, json).with_context(|| format!("write {}", out.display()))?;
    info!("Exported to {}", out.display());
    Ok(())
}
