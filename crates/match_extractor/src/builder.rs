use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

use crate::dialect::{element_text, Intent, MarkupDialect};
use crate::locator::Candidate;
use crate::parsers::{parse_match_time, parse_score, parse_stage, status_override};
use crate::record::{MatchRecord, MatchStatus};

// "g_1_GdPKm9Nq" -> "GdPKm9Nq" (the digit is the sport id)
static ROW_ID_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^g_\d+_").expect("row id prefix regex"));

const LIVE_CLASSES: &[&str] = &["event__match--live", "event__match--twoLine"];
const SCHEDULED_CLASSES: &[&str] = &["event__match--scheduled"];
// "--last" may be legacy markup for the same state; both map to finished
const FINISHED_CLASSES: &[&str] = &["event__match--finished", "event__match--last"];

#[derive(Debug, Clone, Default)]
struct Participant {
    name: Option<String>,
    logo_url: Option<String>,
    red_cards: u32,
}

/// Turns one located row into a `MatchRecord`.
pub struct RecordBuilder<'d> {
    dialect: &'d MarkupDialect,
    site_origin: String,
    today: NaiveDate,
}

impl<'d> RecordBuilder<'d> {
    pub fn new(dialect: &'d MarkupDialect, site_origin: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            dialect,
            site_origin: site_origin.into(),
            today,
        }
    }

    /// `Ok(None)` when the row carries no usable id (header/placeholder rows).
    pub fn build(&self, candidate: &Candidate<'_>) -> Result<Option<MatchRecord>> {
        let row = candidate.row;
        let Some(match_id) = row_match_id(row) else {
            return Ok(None);
        };

        let match_url = self
            .dialect
            .locate(row, Intent::RowLink)
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_url(&self.site_origin, href));

        let parsed_time = self
            .dialect
            .text_of(row, Intent::Time)
            .and_then(|raw| parse_match_time(&raw, self.today));

        let home = self.participant(row, Intent::HomeParticipant);
        let away = self.participant(row, Intent::AwayParticipant);

        let home_score = self.dialect.text_of(row, Intent::HomeScore).and_then(|t| parse_score(&t));
        let away_score = self.dialect.text_of(row, Intent::AwayScore).and_then(|t| parse_score(&t));

        let match_stage = self.stage_text(row);
        let (stage_detail, override_status) = match &match_stage {
            Some(stage) => (parse_stage(stage), status_override(stage)),
            None => Default::default(),
        };

        let status = override_status.unwrap_or_else(|| classify_row(row));

        Ok(Some(MatchRecord {
            match_id,
            match_url,
            league: candidate.league.clone(),
            match_time: parsed_time.as_ref().map(|t| t.display.clone()),
            scheduled_datetime: parsed_time.and_then(|t| t.scheduled),
            home_team_name: home.name,
            home_team_logo_url: home.logo_url,
            away_team_name: away.name,
            away_team_logo_url: away.logo_url,
            home_score,
            away_score,
            home_red_cards: home.red_cards,
            away_red_cards: away.red_cards,
            status: status.flags(),
            match_stage,
            has_tv_icon: self.dialect.exists(row, Intent::TvIcon),
            has_audio_icon: self.dialect.exists(row, Intent::AudioIcon),
            has_info_icon: self.dialect.exists(row, Intent::InfoIcon),
            half_time: stage_detail.half_time,
            current_minute: stage_detail.current_minute,
        }))
    }

    fn participant(&self, row: ElementRef<'_>, side: Intent) -> Participant {
        let Some(container) = self.dialect.locate(row, side) else {
            return Participant::default();
        };

        let logo_url = self
            .dialect
            .locate(container, Intent::ParticipantLogo)
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(str::to_string);

        Participant {
            name: self.dialect.text_of(container, Intent::ParticipantName),
            logo_url,
            red_cards: self.dialect.locate_all(container, Intent::RedCard).len() as u32,
        }
    }

    /// Inner stage block if present, otherwise the whole stage cell.
    fn stage_text(&self, row: ElementRef<'_>) -> Option<String> {
        let stage = self.dialect.locate(row, Intent::Stage)?;
        match self.dialect.text_of(stage, Intent::StageBlock) {
            Some(block) => Some(block),
            None => Some(element_text(stage)).filter(|t| !t.is_empty()),
        }
    }
}

/// Row id with the `g_<sport>_` prefix removed. Blank → `None`.
pub fn row_match_id(row: ElementRef<'_>) -> Option<String> {
    let raw = row.value().attr("id")?.trim();
    let id = ROW_ID_PREFIX.replace(raw, "");
    (!id.is_empty()).then(|| id.into_owned())
}

/// Status from structural classes: live → scheduled → finished → unknown.
pub fn classify_row(row: ElementRef<'_>) -> MatchStatus {
    let has_any = |set: &[&str]| row.value().classes().any(|c| set.contains(&c));

    if has_any(LIVE_CLASSES) {
        MatchStatus::Live
    } else if has_any(SCHEDULED_CLASSES) {
        MatchStatus::Scheduled
    } else if has_any(FINISHED_CLASSES) {
        MatchStatus::Finished
    } else {
        MatchStatus::Unknown
    }
}

/// Resolve a detail-page href against the site origin.
pub fn absolute_url(origin: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }

    let origin = origin.trim_end_matches('/');
    if href.starts_with('/') {
        Some(format!("{origin}{href}"))
    } else {
        Some(format!("{origin}/{href}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LeagueSource;
    use crate::record::LeagueContext;
    use scraper::Html;

    const ORIGIN: &str = "https://www.flashscore.pt";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn build_one(html: &str) -> Result<Option<MatchRecord>> {
        let doc = Html::parse_fragment(html);
        let dialect = MarkupDialect::flashscore("soccer").unwrap();
        let row = dialect.locate(doc.root_element(), Intent::MatchRow).unwrap();
        let candidate = Candidate {
            row,
            league: LeagueContext::default(),
            league_source: LeagueSource::Unresolved,
        };
        RecordBuilder::new(&dialect, ORIGIN, today()).build(&candidate)
    }

    #[test]
    fn finished_row_scenario() {
        let rec = build_one(
            r#"<div id="g_1_abc123" class="event__match event__match--finished" data-event-row="true">
                 <a class="eventRowLink" href="/jogo/futebol/abc123/"></a>
                 <div class="event__stage"><div class="event__stage--block">Terminado</div></div>
                 <div class="event__homeParticipant"><span class="wcl-name_3y6f5">Team A</span>
                   <img data-testid="wcl-participantLogo" src="https://static.flashscore.com/a.png"></div>
                 <div class="event__awayParticipant"><span class="wcl-name_3y6f5">Team B</span></div>
                 <span class="event__score--home">2</span><span class="event__score--away">1</span>
               </div>"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(rec.match_id, "abc123");
        assert_eq!(rec.match_status(), MatchStatus::Finished);
        assert!(rec.status.is_finished());
        assert_eq!(rec.status.true_count(), 1);
        assert_eq!(rec.home_score, Some(2));
        assert_eq!(rec.away_score, Some(1));
        assert_eq!(rec.home_team_name.as_deref(), Some("Team A"));
        assert_eq!(rec.away_team_name.as_deref(), Some("Team B"));
        assert_eq!(rec.home_team_logo_url.as_deref(), Some("https://static.flashscore.com/a.png"));
        assert_eq!(rec.away_team_logo_url, None);
        assert_eq!(rec.match_url.as_deref(), Some("https://www.flashscore.pt/jogo/futebol/abc123/"));
        assert_eq!(rec.match_stage.as_deref(), Some("Terminado"));
    }

    #[test]
    fn scheduled_row_scenario() {
        let rec = build_one(
            r#"<div id="g_1_sch1" class="event__match event__match--scheduled" data-event-row="true">
                 <div class="event__time">15:30</div>
                 <div class="event__homeParticipant"><span class="wcl-name_x">Porto</span></div>
                 <div class="event__awayParticipant"><span class="wcl-name_x">Braga</span></div>
               </div>"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(rec.match_status(), MatchStatus::Scheduled);
        assert_eq!(rec.match_time.as_deref(), Some("15:30"));
        assert_eq!(rec.scheduled_datetime, today().and_hms_opt(15, 30, 0));
        assert_eq!(rec.home_score, None);
        assert_eq!(rec.away_score, None);
    }

    #[test]
    fn cancellation_text_overrides_class_status() {
        let rec = build_one(
            r#"<div id="g_1_c1" class="event__match event__match--live" data-event-row="true">
                 <div class="event__stage">Cancelado</div>
               </div>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(rec.match_status(), MatchStatus::Canceled);
        assert!(rec.status.is_canceled());
        assert!(!rec.status.is_live());
    }

    #[test]
    fn live_row_carries_minute_and_red_cards() {
        let rec = build_one(
            r#"<div id="g_1_l1" class="event__match event__match--live" data-event-row="true">
                 <div class="event__stage"><div class="event__stage--block">67'</div></div>
                 <div class="event__homeParticipant"><span class="wcl-name_a">X</span>
                   <svg class="card-ico icon--redCard"></svg><svg class="card-ico icon--redCard"></svg></div>
                 <div class="event__awayParticipant"><span class="wcl-name_a">Y</span></div>
                 <span class="event__score--home">1</span><span class="event__score--away">-</span>
                 <a class="event__icon--tv"></a><svg class="event__icon--info"></svg>
               </div>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(rec.match_status(), MatchStatus::Live);
        assert_eq!(rec.current_minute, Some(67));
        assert_eq!(rec.half_time, None);
        assert_eq!(rec.home_red_cards, 2);
        assert_eq!(rec.away_red_cards, 0);
        assert_eq!(rec.away_score, None);
        assert!(rec.has_tv_icon);
        assert!(!rec.has_audio_icon);
        assert!(rec.has_info_icon);
    }

    #[test]
    fn last_class_counts_as_finished() {
        let rec = build_one(
            r#"<div id="g_1_z" class="event__match event__match--last" data-event-row="true"></div>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(rec.match_status(), MatchStatus::Finished);
    }

    #[test]
    fn row_without_id_is_skipped_not_failed() {
        let out = build_one(r#"<div class="event__match" data-event-row="true"></div>"#).unwrap();
        assert!(out.is_none());
        let out = build_one(r#"<div id="g_1_" class="event__match" data-event-row="true"></div>"#).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn oversized_minute_keeps_the_row() {
        let rec = build_one(
            r#"<div id="g_1_keep" class="event__match event__match--live" data-event-row="true">
                 <div class="event__stage">99999999999'</div>
                 <div class="event__homeParticipant"><span class="wcl-name_a">Home</span></div>
                 <div class="event__awayParticipant"><span class="wcl-name_a">Away</span></div>
                 <span class="event__score--home">1</span><span class="event__score--away">0</span>
               </div>"#,
        )
        .unwrap()
        .expect("row kept");
        assert_eq!(rec.match_id, "keep");
        assert_eq!(rec.current_minute, None);
        assert_eq!(rec.match_status(), MatchStatus::Live);
        assert_eq!(rec.home_score, Some(1));
        assert_eq!(rec.away_score, Some(0));
        assert_eq!(rec.home_team_name.as_deref(), Some("Home"));
        assert_eq!(rec.match_stage.as_deref(), Some("99999999999'"));
    }

    #[test]
    fn urls_are_made_absolute() {
        assert_eq!(absolute_url(ORIGIN, "/jogo/x/").as_deref(), Some("https://www.flashscore.pt/jogo/x/"));
        assert_eq!(absolute_url("https://www.flashscore.pt/", "jogo/x/").as_deref(), Some("https://www.flashscore.pt/jogo/x/"));
        assert_eq!(absolute_url(ORIGIN, "//cdn.example/x").as_deref(), Some("https://cdn.example/x"));
        assert_eq!(absolute_url(ORIGIN, "https://other/x").as_deref(), Some("https://other/x"));
        assert_eq!(absolute_url(ORIGIN, "  "), None);
        assert_eq!(absolute_url(ORIGIN, "#"), None);
    }
}
