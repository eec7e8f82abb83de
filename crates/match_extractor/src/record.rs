use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress state of a match. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Live,
    Scheduled,
    Finished,
    Canceled,
    Postponed,
    Unknown,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 6] = [
        MatchStatus::Live,
        MatchStatus::Scheduled,
        MatchStatus::Finished,
        MatchStatus::Canceled,
        MatchStatus::Postponed,
        MatchStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Live => "live",
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Finished => "finished",
            MatchStatus::Canceled => "canceled",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Unknown => "unknown",
        }
    }

    pub fn flags(self) -> StatusFlags {
        StatusFlags::from(self)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatchStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown match status {:?}", s))
    }
}

/// Legacy boolean mirrors of `MatchStatus`.
///
/// Only constructible from a status, so the booleans can never drift from the
/// enumeration. An `unknown` status has every mirror false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusFlags {
    match_status: MatchStatus,
    is_live: bool,
    is_scheduled: bool,
    is_finished: bool,
    is_canceled: bool,
    is_postponed: bool,
}

impl From<MatchStatus> for StatusFlags {
    fn from(status: MatchStatus) -> Self {
        Self {
            match_status: status,
            is_live: status == MatchStatus::Live,
            is_scheduled: status == MatchStatus::Scheduled,
            is_finished: status == MatchStatus::Finished,
            is_canceled: status == MatchStatus::Canceled,
            is_postponed: status == MatchStatus::Postponed,
        }
    }
}

impl StatusFlags {
    pub fn status(&self) -> MatchStatus { self.match_status }
    pub fn is_live(&self) -> bool { self.is_live }
    pub fn is_scheduled(&self) -> bool { self.is_scheduled }
    pub fn is_finished(&self) -> bool { self.is_finished }
    pub fn is_canceled(&self) -> bool { self.is_canceled }
    pub fn is_postponed(&self) -> bool { self.is_postponed }

    /// Number of mirrors set. 1 for every known status, 0 for `unknown`.
    pub fn true_count(&self) -> usize {
        [
            self.is_live,
            self.is_scheduled,
            self.is_finished,
            self.is_canceled,
            self.is_postponed,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

/// Nearest league/category heading of a match row. All-null when unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueContext {
    pub league_name: Option<String>,
    pub league_country: Option<String>,
    pub league_flag_class: Option<String>,
}

impl LeagueContext {
    pub fn is_resolved(&self) -> bool {
        self.league_name.is_some()
    }
}

/// One normalized match row as extracted from the listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub match_url: Option<String>,
    #[serde(flatten)]
    pub league: LeagueContext,
    pub match_time: Option<String>,
    pub scheduled_datetime: Option<NaiveDateTime>,
    pub home_team_name: Option<String>,
    pub home_team_logo_url: Option<String>,
    pub away_team_name: Option<String>,
    pub away_team_logo_url: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub home_red_cards: u32,
    pub away_red_cards: u32,
    #[serde(flatten)]
    pub status: StatusFlags,
    pub match_stage: Option<String>,
    pub has_tv_icon: bool,
    pub has_audio_icon: bool,
    pub has_info_icon: bool,
    pub half_time: Option<String>,
    pub current_minute: Option<u32>,
}

impl MatchRecord {
    pub fn match_status(&self) -> MatchStatus {
        self.status.status()
    }

    pub fn set_status(&mut self, status: MatchStatus) {
        self.status = StatusFlags::from(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_status_sets_exactly_one_mirror() {
        for st in MatchStatus::ALL {
            let flags = st.flags();
            let expected = if st == MatchStatus::Unknown { 0 } else { 1 };
            assert_eq!(flags.true_count(), expected, "{st}");
            assert_eq!(flags.status(), st);
        }
        assert!(MatchStatus::Canceled.flags().is_canceled());
        assert!(!MatchStatus::Canceled.flags().is_finished());
    }

    #[test]
    fn status_round_trips_through_its_text_form() {
        for st in MatchStatus::ALL {
            assert_eq!(st.as_str().parse::<MatchStatus>().unwrap(), st);
        }
        assert!("halftime".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn flags_serialize_flat_with_status_text() {
        let v = serde_json::to_value(MatchStatus::Live.flags()).unwrap();
        assert_eq!(v["match_status"], "live");
        assert_eq!(v["is_live"], true);
        assert_eq!(v["is_finished"], false);
    }
}
