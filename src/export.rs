//! JSON documents written by `export-json`.

use chrono::{DateTime, Local};
use match_extractor::MatchStatus;
use match_store::StoredMatch;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct MatchExport<'a> {
    pub export_date: String,
    pub total_matches: usize,
    pub status_filter: String,
    pub matches: &'a [StoredMatch],
}

pub fn match_export(matches: &[StoredMatch], status: Option<MatchStatus>, now: DateTime<Local>) -> MatchExport<'_> {
    MatchExport {
        export_date: now.to_rfc3339(),
        total_matches: matches.len(),
        status_filter: status.map_or_else(|| "all".to_string(), |s| s.to_string()),
        matches,
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryEntry {
    pub match_id: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub score: String,
    pub match_time: Option<String>,
    pub league: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusGroup {
    pub count: usize,
    pub matches: Vec<SummaryEntry>,
}

#[derive(Debug, Serialize)]
pub struct SummaryExport {
    pub export_date: String,
    pub total_matches: i64,
    pub summary: BTreeMap<MatchStatus, StatusGroup>,
}

fn score_cell(score: Option<i32>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

/// Matches grouped by status; only statuses that occur get a group.
pub fn summary_export(matches: &[StoredMatch], total_matches: i64, now: DateTime<Local>) -> SummaryExport {
    let mut summary: BTreeMap<MatchStatus, StatusGroup> = BTreeMap::new();
    for m in matches {
        let group = summary.entry(m.match_status).or_insert_with(|| StatusGroup {
            count: 0,
            matches: Vec::new(),
        });
        group.count += 1;
        group.matches.push(SummaryEntry {
            match_id: m.match_id.clone(),
            home_team: m.home_team_name.clone(),
            away_team: m.away_team_name.clone(),
            score: format!("{} - {}", score_cell(m.home_score), score_cell(m.away_score)),
            match_time: m.match_time.clone(),
            league: m.league_name.clone(),
        });
    }

    SummaryExport {
        export_date: now.to_rfc3339(),
        total_matches,
        summary,
    }
}

/// `outputs/matches[_<status>]_<timestamp>.json` or the summary equivalent.
pub fn default_output_path(status: Option<MatchStatus>, summary: bool, now: DateTime<Local>) -> String {
    let stamp = now.format("%Y-%m-%d_%H-%M-%S");
    if summary {
        return format!("outputs/matches_summary_{stamp}.json");
    }
    match status {
        Some(s) => format!("outputs/matches_{s}_{stamp}.json"),
        None => format!("outputs/matches_{stamp}.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use match_store::MatchStore;
    use match_extractor::{LeagueContext, MatchRecord};

    fn stored(records: &[MatchRecord]) -> Vec<StoredMatch> {
        let mut store = MatchStore::open_in_memory().unwrap();
        store.upsert_batch(records);
        store.all_matches().unwrap()
    }

    fn rec(id: &str, status: MatchStatus, score: Option<(i32, i32)>) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            match_url: None,
            league: LeagueContext {
                league_name: Some("Liga Portugal".to_string()),
                league_country: Some("PORTUGAL".to_string()),
                league_flag_class: None,
            },
            match_time: Some("20:00".to_string()),
            scheduled_datetime: None,
            home_team_name: Some("Benfica".to_string()),
            home_team_logo_url: None,
            away_team_name: Some("Porto".to_string()),
            away_team_logo_url: None,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            home_red_cards: 0,
            away_red_cards: 0,
            status: status.flags(),
            match_stage: None,
            has_tv_icon: false,
            has_audio_icon: false,
            has_info_icon: false,
            half_time: None,
            current_minute: None,
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 21, 5, 0).unwrap()
    }

    #[test]
    fn summary_groups_by_status() {
        let matches = stored(&[
            rec("a", MatchStatus::Finished, Some((2, 1))),
            rec("b", MatchStatus::Scheduled, None),
            rec("c", MatchStatus::Finished, Some((0, 0))),
        ]);
        let doc = summary_export(&matches, 3, now());

        assert_eq!(doc.total_matches, 3);
        assert_eq!(doc.summary.len(), 2);
        let finished = &doc.summary[&MatchStatus::Finished];
        assert_eq!(finished.count, 2);
        assert_eq!(finished.matches[0].score, "2 - 1");
        assert_eq!(finished.matches[0].league.as_deref(), Some("Liga Portugal"));
        assert_eq!(doc.summary[&MatchStatus::Scheduled].matches[0].score, "- - -");

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["summary"]["finished"]["count"], 2);
    }

    #[test]
    fn export_records_the_filter() {
        let matches = stored(&[rec("a", MatchStatus::Live, Some((1, 0)))]);
        let doc = match_export(&matches, Some(MatchStatus::Live), now());
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["status_filter"], "live");
        assert_eq!(v["total_matches"], 1);
        assert_eq!(v["matches"][0]["is_live"], true);

        let doc = match_export(&matches, None, now());
        assert_eq!(doc.status_filter, "all");
    }

    #[test]
    fn output_names() {
        assert_eq!(
            default_output_path(Some(MatchStatus::Live), false, now()),
            "outputs/matches_live_2026-10-19_21-05-00.json"
        );
        assert_eq!(
            default_output_path(None, true, now()),
            "outputs/matches_summary_2026-10-19_21-05-00.json"
        );
    }
}
