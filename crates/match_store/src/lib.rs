//! SQLite persistence for extracted matches.
//!
//! Leagues and teams are normalized into their own tables (get-or-create by
//! natural key); matches are upserted by `match_id`, one transaction per record.

pub mod query;
pub mod resolver;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use logger::{now_iso, EventLogger, StoreBatchEvent, UpsertFailedEvent};
use match_extractor::MatchRecord;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use query::StoredMatch;
pub use resolver::{get_or_create_league, get_or_create_team, normalize_key};

/// How many failed ids a batch summary lists before "... and N more".
pub const FAILED_PREVIEW: usize = 5;

/// How long a writer waits on another connection's lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Stored form of `scheduled_datetime`; SQLite's `date()` understands it.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn failed_preview(&self, limit: usize) -> &[String] {
        &self.failed[..self.failed.len().min(limit)]
    }

    pub fn failed_overflow(&self, limit: usize) -> usize {
        self.failed.len().saturating_sub(limit)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "saved {}/{} matches ({} new, {} updated)",
            self.saved(),
            self.total,
            self.inserted,
            self.updated
        )?;
        if !self.failed.is_empty() {
            write!(
                f,
                "; {} failed: {}",
                self.failed.len(),
                self.failed_preview(FAILED_PREVIEW).join(", ")
            )?;
            let more = self.failed_overflow(FAILED_PREVIEW);
            if more > 0 {
                write!(f, " ... and {more} more")?;
            }
        }
        Ok(())
    }
}

pub struct MatchStore {
    conn: Connection,
    logger: EventLogger,
}

impl MatchStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db {}", db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.busy_timeout(BUSY_TIMEOUT).context("set busy timeout")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("enable foreign keys")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn,
            logger: EventLogger::disabled(),
        })
    }

    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn upsert(&mut self, record: &MatchRecord) -> Result<UpsertOutcome> {
        self.upsert_at(record, Utc::now())
    }

    /// Resolve league and teams, then insert or update the match row. All of it
    /// commits together or not at all. `scraped_at` is written on insert only.
    /// The write lock is taken up front so a concurrent writer waits on the busy
    /// timeout instead of failing mid-transaction.
    pub fn upsert_at(&mut self, record: &MatchRecord, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        let ts = now.to_rfc3339();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .with_context(|| format!("begin upsert {}", record.match_id))?;

        let league = &record.league;
        let league_id = get_or_create_league(
            &tx,
            league.league_name.as_deref(),
            league.league_country.as_deref(),
            league.league_flag_class.as_deref(),
            None,
            &ts,
        )?;
        let home_team_id = get_or_create_team(
            &tx,
            record.home_team_name.as_deref(),
            record.home_team_logo_url.as_deref(),
            &ts,
        )?;
        let away_team_id = get_or_create_team(
            &tx,
            record.away_team_name.as_deref(),
            record.away_team_logo_url.as_deref(),
            &ts,
        )?;

        let existed = tx
            .query_row(
                "SELECT id FROM matches WHERE match_id = ?1",
                params![record.match_id],
                |r| r.get::<_, i64>(0),
            )
            .optional()
            .context("lookup match")?
            .is_some();

        let scheduled = record
            .scheduled_datetime
            .map(|dt| dt.format(DATETIME_FORMAT).to_string());
        let match_date = record
            .scheduled_datetime
            .map(|dt| dt.date().format("%Y-%m-%d").to_string());
        let flags = record.status;

        tx.execute(
            r#"
            INSERT INTO matches(
                match_id, match_url, league_id, home_team_id, away_team_id,
                match_time, scheduled_datetime, match_date,
                home_score, away_score, home_red_cards, away_red_cards,
                match_status, is_live, is_scheduled, is_finished, is_canceled, is_postponed,
                match_stage, has_tv_icon, has_audio_icon, has_info_icon,
                half_time, current_minute, scraped_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                    ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?25)
            ON CONFLICT(match_id) DO UPDATE SET
                match_url=excluded.match_url,
                league_id=excluded.league_id,
                home_team_id=excluded.home_team_id,
                away_team_id=excluded.away_team_id,
                match_time=excluded.match_time,
                scheduled_datetime=excluded.scheduled_datetime,
                match_date=excluded.match_date,
                home_score=excluded.home_score,
                away_score=excluded.away_score,
                home_red_cards=excluded.home_red_cards,
                away_red_cards=excluded.away_red_cards,
                match_status=excluded.match_status,
                is_live=excluded.is_live,
                is_scheduled=excluded.is_scheduled,
                is_finished=excluded.is_finished,
                is_canceled=excluded.is_canceled,
                is_postponed=excluded.is_postponed,
                match_stage=excluded.match_stage,
                has_tv_icon=excluded.has_tv_icon,
                has_audio_icon=excluded.has_audio_icon,
                has_info_icon=excluded.has_info_icon,
                half_time=excluded.half_time,
                current_minute=excluded.current_minute,
                updated_at=excluded.updated_at
            "#,
            params![
                record.match_id,
                record.match_url,
                league_id,
                home_team_id,
                away_team_id,
                record.match_time,
                scheduled,
                match_date,
                record.home_score,
                record.away_score,
                record.home_red_cards,
                record.away_red_cards,
                flags.status().as_str(),
                flags.is_live(),
                flags.is_scheduled(),
                flags.is_finished(),
                flags.is_canceled(),
                flags.is_postponed(),
                record.match_stage,
                record.has_tv_icon,
                record.has_audio_icon,
                record.has_info_icon,
                record.half_time,
                record.current_minute,
                ts,
            ],
        )
        .with_context(|| format!("upsert match {}", record.match_id))?;

        tx.commit()
            .with_context(|| format!("commit match {}", record.match_id))?;

        let outcome = if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        debug!("{:?} match {}", outcome, record.match_id);
        Ok(outcome)
    }

    /// Upsert every record; a failure is rolled back, reported and skipped.
    pub fn upsert_batch(&mut self, records: &[MatchRecord]) -> BatchReport {
        let mut report = BatchReport {
            total: records.len(),
            ..BatchReport::default()
        };

        for record in records {
            match self.upsert(record) {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(
                        "Error saving match {} ({} vs {}): {:#}",
                        record.match_id,
                        record.home_team_name.as_deref().unwrap_or("?"),
                        record.away_team_name.as_deref().unwrap_or("?"),
                        e
                    );
                    self.logger.report(&UpsertFailedEvent {
                        ts:        now_iso(),
                        event:     "UPSERT_FAILED",
                        match_id:  record.match_id.clone(),
                        home_team: record.home_team_name.clone(),
                        away_team: record.away_team_name.clone(),
                        error:     format!("{e:#}"),
                    });
                    report.failed.push(record.match_id.clone());
                }
            }
        }

        if report.failed.is_empty() {
            info!("{}", report);
        } else {
            warn!("{}", report);
        }
        self.logger.report(&StoreBatchEvent {
            ts:             now_iso(),
            event:          "STORE_BATCH",
            total:          report.total,
            inserted:       report.inserted,
            updated:        report.updated,
            failed:         report.failed.len(),
            failed_preview: report.failed_preview(FAILED_PREVIEW).to_vec(),
        });
        report
    }
}
