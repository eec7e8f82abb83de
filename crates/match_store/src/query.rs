//! Read side: matches joined back with league and team names.

use anyhow::{Context, Result};
use match_extractor::MatchStatus;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::MatchStore;

/// One stored match as exported: booleans are booleans, names are joined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMatch {
    pub id: i64,
    pub match_id: String,
    pub match_url: Option<String>,
    pub league_id: Option<i64>,
    pub league_name: Option<String>,
    pub league_country: Option<String>,
    pub league_flag_class: Option<String>,
    pub home_team_id: Option<i64>,
    pub home_team_name: Option<String>,
    pub home_team_logo_url: Option<String>,
    pub away_team_id: Option<i64>,
    pub away_team_name: Option<String>,
    pub away_team_logo_url: Option<String>,
    pub match_time: Option<String>,
    pub scheduled_datetime: Option<String>,
    pub match_date: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub home_red_cards: u32,
    pub away_red_cards: u32,
    pub match_status: MatchStatus,
    pub is_live: bool,
    pub is_scheduled: bool,
    pub is_finished: bool,
    pub is_canceled: bool,
    pub is_postponed: bool,
    pub match_stage: Option<String>,
    pub has_tv_icon: bool,
    pub has_audio_icon: bool,
    pub has_info_icon: bool,
    pub half_time: Option<String>,
    pub current_minute: Option<u32>,
    pub scraped_at: String,
    pub updated_at: String,
}

impl StoredMatch {
    /// `"2 - 1"`, or `None` until both sides have a score.
    pub fn score_line(&self) -> Option<String> {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some(format!("{h} - {a}")),
            _ => None,
        }
    }
}

const SELECT_MATCH: &str = r#"
    SELECT m.id, m.match_id, m.match_url,
           m.league_id, l.name, l.country, l.flag_class,
           m.home_team_id, ht.name, ht.logo_url,
           m.away_team_id, aw.name, aw.logo_url,
           m.match_time, m.scheduled_datetime, m.match_date,
           m.home_score, m.away_score, m.home_red_cards, m.away_red_cards,
           m.match_status, m.is_live, m.is_scheduled, m.is_finished, m.is_canceled, m.is_postponed,
           m.match_stage, m.has_tv_icon, m.has_audio_icon, m.has_info_icon,
           m.half_time, m.current_minute, m.scraped_at, m.updated_at
    FROM matches m
    LEFT JOIN leagues l ON l.id = m.league_id
    LEFT JOIN teams ht ON ht.id = m.home_team_id
    LEFT JOIN teams aw ON aw.id = m.away_team_id
"#;

fn row_to_match(r: &Row<'_>) -> rusqlite::Result<StoredMatch> {
    let status: String = r.get(20)?;
    let match_status = status
        .parse::<MatchStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(20, Type::Text, e.into()))?;

    Ok(StoredMatch {
        id: r.get(0)?,
        match_id: r.get(1)?,
        match_url: r.get(2)?,
        league_id: r.get(3)?,
        league_name: r.get(4)?,
        league_country: r.get(5)?,
        league_flag_class: r.get(6)?,
        home_team_id: r.get(7)?,
        home_team_name: r.get(8)?,
        home_team_logo_url: r.get(9)?,
        away_team_id: r.get(10)?,
        away_team_name: r.get(11)?,
        away_team_logo_url: r.get(12)?,
        match_time: r.get(13)?,
        scheduled_datetime: r.get(14)?,
        match_date: r.get(15)?,
        home_score: r.get(16)?,
        away_score: r.get(17)?,
        home_red_cards: r.get(18)?,
        away_red_cards: r.get(19)?,
        match_status,
        is_live: r.get(21)?,
        is_scheduled: r.get(22)?,
        is_finished: r.get(23)?,
        is_canceled: r.get(24)?,
        is_postponed: r.get(25)?,
        match_stage: r.get(26)?,
        has_tv_icon: r.get(27)?,
        has_audio_icon: r.get(28)?,
        has_info_icon: r.get(29)?,
        half_time: r.get(30)?,
        current_minute: r.get(31)?,
        scraped_at: r.get(32)?,
        updated_at: r.get(33)?,
    })
}

impl MatchStore {
    pub fn get_match(&self, match_id: &str) -> Result<Option<StoredMatch>> {
        self.conn
            .query_row(
                &format!("{SELECT_MATCH} WHERE m.match_id = ?1"),
                params![match_id],
                row_to_match,
            )
            .optional()
            .with_context(|| format!("read match {match_id}"))
    }

    /// Newest kick-off first.
    pub fn all_matches(&self) -> Result<Vec<StoredMatch>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{SELECT_MATCH} ORDER BY m.scheduled_datetime DESC, m.match_time DESC, m.id"
            ))
            .context("prepare all matches")?;
        let rows = stmt
            .query_map([], row_to_match)
            .context("query all matches")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read all matches")?;
        Ok(rows)
    }

    pub fn matches_by_status(&self, status: MatchStatus) -> Result<Vec<StoredMatch>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{SELECT_MATCH} WHERE m.match_status = ?1 ORDER BY m.scheduled_datetime DESC, m.id"
            ))
            .context("prepare matches by status")?;
        let rows = stmt
            .query_map(params![status.as_str()], row_to_match)
            .with_context(|| format!("query {status} matches"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("read {status} matches"))?;
        Ok(rows)
    }

    pub fn count_matches(&self) -> Result<i64> {
        self.count("matches")
    }

    pub fn count_leagues(&self) -> Result<i64> {
        self.count("leagues")
    }

    pub fn count_teams(&self) -> Result<i64> {
        self.count("teams")
    }

    fn count(&self, table: &'static str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(1) FROM {table}"), [], |r| r.get(0))
            .with_context(|| format!("count {table}"))
    }

    /// Stored matches per status. Statuses with no rows are absent.
    pub fn status_counts(&self) -> Result<BTreeMap<MatchStatus, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT match_status, COUNT(1) FROM matches GROUP BY match_status")
            .context("prepare status counts")?;
        let mut out = BTreeMap::new();
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))
            .context("query status counts")?;
        for row in rows {
            let (status, count) = row.context("read status count")?;
            out.insert(status.parse::<MatchStatus>()?, count);
        }
        Ok(out)
    }
}
