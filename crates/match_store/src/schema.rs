use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create tables and indexes if missing. Safe to run on every open.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT,
            name_key TEXT NOT NULL,
            country_key TEXT NOT NULL DEFAULT '',
            flag_class TEXT,
            logo_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name_key, country_key)
        );

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            logo_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL UNIQUE CHECK (length(match_id) > 0),
            match_url TEXT,
            league_id INTEGER REFERENCES leagues(id),
            home_team_id INTEGER REFERENCES teams(id),
            away_team_id INTEGER REFERENCES teams(id),
            match_time TEXT,
            scheduled_datetime TEXT,
            match_date TEXT,
            home_score INTEGER,
            away_score INTEGER,
            home_red_cards INTEGER NOT NULL DEFAULT 0 CHECK (home_red_cards >= 0),
            away_red_cards INTEGER NOT NULL DEFAULT 0 CHECK (away_red_cards >= 0),
            match_status TEXT NOT NULL DEFAULT 'unknown'
                CHECK (match_status IN ('live', 'scheduled', 'finished', 'canceled', 'postponed', 'unknown')),
            is_live INTEGER NOT NULL DEFAULT 0 CHECK (is_live = (match_status = 'live')),
            is_scheduled INTEGER NOT NULL DEFAULT 0 CHECK (is_scheduled = (match_status = 'scheduled')),
            is_finished INTEGER NOT NULL DEFAULT 0 CHECK (is_finished = (match_status = 'finished')),
            is_canceled INTEGER NOT NULL DEFAULT 0 CHECK (is_canceled = (match_status = 'canceled')),
            is_postponed INTEGER NOT NULL DEFAULT 0 CHECK (is_postponed = (match_status = 'postponed')),
            match_stage TEXT,
            has_tv_icon INTEGER NOT NULL DEFAULT 0,
            has_audio_icon INTEGER NOT NULL DEFAULT 0,
            has_info_icon INTEGER NOT NULL DEFAULT 0,
            half_time TEXT,
            current_minute INTEGER,
            scraped_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (
                (scheduled_datetime IS NULL AND match_date IS NULL)
                OR (match_date IS NOT NULL AND match_date = date(scheduled_datetime))
            )
        );

        CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(match_status);
        CREATE INDEX IF NOT EXISTS idx_matches_scheduled ON matches(scheduled_datetime);
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id);
        "#,
    )
    .context("init schema")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_init_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name IN ('leagues', 'teams', 'matches')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn status_mirror_mismatch_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO matches(match_id, match_status, is_live, is_finished, scraped_at, updated_at)
             VALUES ('x', 'finished', 1, 1, 't', 't')",
            [],
        );
        assert!(bad.is_err());

        let ok = conn.execute(
            "INSERT INTO matches(match_id, match_status, is_finished, scraped_at, updated_at)
             VALUES ('y', 'finished', 1, 't', 't')",
            [],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn match_date_must_follow_scheduled_datetime() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO matches(match_id, scheduled_datetime, match_date, scraped_at, updated_at)
             VALUES ('x', '2026-10-19T15:30:00', '2026-10-20', 't', 't')",
            [],
        );
        assert!(bad.is_err());

        let orphan_date = conn.execute(
            "INSERT INTO matches(match_id, match_date, scraped_at, updated_at)
             VALUES ('y', '2026-10-20', 't', 't')",
            [],
        );
        assert!(orphan_date.is_err());

        let ok = conn.execute(
            "INSERT INTO matches(match_id, scheduled_datetime, match_date, scraped_at, updated_at)
             VALUES ('z', '2026-10-19T15:30:00', '2026-10-19', 't', 't')",
            [],
        );
        assert!(ok.is_ok());
    }
}
