use anyhow::{Context, Result};
use dotenv::dotenv;
use match_extractor::MatchStatus;
use match_store::MatchStore;
use rusqlite::OptionalExtension;
use scoreline_ingest::config::db_path_from_env;

fn main() -> Result<()> {
    dotenv().ok();
    let db_path = db_path_from_env();
    let store = MatchStore::open(&db_path)
        .with_context(|| format!("open db at {}", db_path.display()))?;

    println!("db_path={}", db_path.display());
    println!("leagues: {}", store.count_leagues()?);
    println!("teams: {}", store.count_teams()?);
    println!("matches: {}", store.count_matches()?);

    let by_status = store.status_counts()?;
    for status in MatchStatus::ALL {
        println!("  {status}: {}", by_status.get(&status).copied().unwrap_or(0));
    }

    let last: Option<(String, String, String)> = store
        .connection()
        .query_row(
            "SELECT match_id, match_status, updated_at FROM matches ORDER BY updated_at DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .context("read last update")?;

    if let Some((match_id, status, updated_at)) = last {
        println!("last_update: ts={updated_at} match_id={match_id} status={status}");
    } else {
        println!("last_update: <none>");
    }

    Ok(())
}
