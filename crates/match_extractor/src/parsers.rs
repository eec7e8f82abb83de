//! Pure text → value parsers for the fields of a match row.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::record::MatchStatus;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock regex"));

// "67'", "90+3'" -> base minute; stoppage time is dropped
static MINUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\+\d+)?'").expect("minute regex"));

const HALF_TIME_TOKENS: &[&str] = &["HT", "INTERVALO"];
const CANCELED_TOKENS: &[&str] = &["cancelado", "canceled", "cancelled"];
const POSTPONED_TOKENS: &[&str] = &["adiado", "postponed"];

pub const HALF_TIME_MARKER: &str = "HT";

/// Display time plus the instant derived from it, if it was a clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTime {
    pub display: String,
    pub scheduled: Option<NaiveDateTime>,
}

/// `"15:30"` becomes `today` at 15:30. Anything else (`"FT"`, `"45'"`, `"25:00"`)
/// is kept as a display string with no instant. Blank input is absent.
pub fn parse_match_time(raw: &str, today: NaiveDate) -> Option<ParsedTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let scheduled = CLOCK_RE.captures(raw).and_then(|caps| {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        today.and_hms_opt(hour, minute, 0)
    });

    Some(ParsedTime {
        display: raw.to_string(),
        scheduled,
    })
}

/// In-play detail carried by the stage text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageDetail {
    pub half_time: Option<String>,
    pub current_minute: Option<u32>,
}

/// Half-time wins over a minute counter; at most one of the two is set.
/// A minute too large to represent is treated as absent.
pub fn parse_stage(stage: &str) -> StageDetail {
    let upper = stage.to_uppercase();
    if HALF_TIME_TOKENS.iter().any(|tok| upper.contains(tok)) {
        return StageDetail {
            half_time: Some(HALF_TIME_MARKER.to_string()),
            current_minute: None,
        };
    }

    let current_minute = MINUTE_RE.captures(stage).and_then(|caps| match caps[1].parse::<u32>() {
        Ok(minute) => Some(minute),
        Err(e) => {
            debug!("ignoring stage minute in {:?}: {}", stage, e);
            None
        }
    });

    StageDetail {
        half_time: None,
        current_minute,
    }
}

/// Cancellation/postponement tokens (pt + en). Cancellation is checked first.
pub fn status_override(stage: &str) -> Option<MatchStatus> {
    let lower = stage.to_lowercase();
    if CANCELED_TOKENS.iter().any(|tok| lower.contains(tok)) {
        Some(MatchStatus::Canceled)
    } else if POSTPONED_TOKENS.iter().any(|tok| lower.contains(tok)) {
        Some(MatchStatus::Postponed)
    } else {
        None
    }
}

/// Score cell text. Blank, `-` or non-numeric → `None` (not 0).
pub fn parse_score(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }
    raw.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn clock_time_becomes_instant_today() {
        let t = parse_match_time(" 15:30 ", today()).unwrap();
        assert_eq!(t.display, "15:30");
        assert_eq!(t.scheduled, today().and_hms_opt(15, 30, 0));

        let t = parse_match_time("9:05", today()).unwrap();
        assert_eq!(t.scheduled, today().and_hms_opt(9, 5, 0));
    }

    #[test]
    fn non_clock_time_is_kept_raw() {
        for raw in ["FT", "45'", "Terminado", "25:00", "12:5"] {
            let t = parse_match_time(raw, today()).unwrap();
            assert_eq!(t.display, raw);
            assert_eq!(t.scheduled, None, "{raw}");
        }
        assert_eq!(parse_match_time("   ", today()), None);
        assert_eq!(parse_match_time("", today()), None);
    }

    #[test]
    fn half_time_checked_before_minute() {
        let d = parse_stage("Intervalo");
        assert_eq!(d.half_time.as_deref(), Some("HT"));
        assert_eq!(d.current_minute, None);

        let d = parse_stage("HT 45'");
        assert_eq!(d.half_time.as_deref(), Some("HT"));
        assert_eq!(d.current_minute, None);
    }

    #[test]
    fn minute_counter_parsed() {
        assert_eq!(parse_stage("67'").current_minute, Some(67));
        assert_eq!(parse_stage("90+3'").current_minute, Some(90));
        assert_eq!(parse_stage("Terminado"), StageDetail::default());
    }

    #[test]
    fn oversized_minute_is_absent() {
        let d = parse_stage("99999999999999'");
        assert_eq!(d.current_minute, None);
        assert_eq!(d.half_time, None);
    }

    #[test]
    fn override_tokens_in_both_languages() {
        assert_eq!(status_override("Cancelado"), Some(MatchStatus::Canceled));
        assert_eq!(status_override("Canceled"), Some(MatchStatus::Canceled));
        assert_eq!(status_override("Adiado"), Some(MatchStatus::Postponed));
        assert_eq!(status_override("Postponed"), Some(MatchStatus::Postponed));
        assert_eq!(status_override("2nd half"), None);
    }

    #[test]
    fn dash_score_is_null_not_zero() {
        assert_eq!(parse_score("-"), None);
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("abc"), None);
        assert_eq!(parse_score("0"), Some(0));
        assert_eq!(parse_score(" 3 "), Some(3));
    }
}
