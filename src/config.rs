use chrono::NaiveDate;
use match_extractor::{ExtractorOptions, MatchStatus, DEFAULT_SITE_ORIGIN, DEFAULT_SPORT};
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_DB_PATH: &str = "data/matches.db";
pub const DEFAULT_HTML_PATH: &str = "outputs/step-1/after_accept_cookies.html";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Settings for one ingest run, read from the environment (`.env` honoured).
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub db_path: PathBuf,
    pub html_path: PathBuf,
    /// When set the page is fetched over HTTP instead of read from `html_path`.
    pub source_url: Option<String>,
    pub site_origin: String,
    pub sport: String,
    pub log_dir: PathBuf,
    pub image_cache_dir: Option<PathBuf>,
    pub today: Option<NaiveDate>,
}

impl IngestConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            db_path: db_path_from(&var),
            html_path: var("INGEST_HTML_PATH")
                .unwrap_or_else(|| DEFAULT_HTML_PATH.to_string())
                .into(),
            source_url: var("INGEST_SOURCE_URL"),
            site_origin: var("INGEST_SITE_ORIGIN").unwrap_or_else(|| DEFAULT_SITE_ORIGIN.to_string()),
            sport: var("INGEST_SPORT").unwrap_or_else(|| DEFAULT_SPORT.to_string()),
            log_dir: var("INGEST_LOG_DIR")
                .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
                .into(),
            image_cache_dir: var("IMAGE_CACHE_DIR").map(PathBuf::from),
            today: var("INGEST_TODAY").and_then(|v| parse_today(&v)),
        }
    }

    pub fn extractor_options(&self) -> ExtractorOptions {
        ExtractorOptions {
            sport: self.sport.clone(),
            site_origin: self.site_origin.clone(),
            today: self.today,
        }
    }
}

/// `YYYY-MM-DD`; anything else is ignored with a warning and local today is used.
fn parse_today(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Ignoring malformed INGEST_TODAY {:?} ({}); using local today", value, e);
            None
        }
    }
}

fn db_path_from(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    var("MATCH_DB_PATH")
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
        .into()
}

/// `MATCH_DB_PATH` with its default, for the read-only binaries.
pub fn db_path_from_env() -> PathBuf {
    db_path_from(&|key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty()))
}

/// Settings for `export-json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub db_path: PathBuf,
    pub status: Option<MatchStatus>,
    pub out: Option<PathBuf>,
    pub summary: bool,
}

impl ExportConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Fails on an `EXPORT_STATUS` outside the status enumeration.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let status = match var("EXPORT_STATUS") {
            Some(s) if s != "all" => Some(s.to_lowercase().parse::<MatchStatus>()?),
            _ => None,
        };

        Ok(Self {
            db_path: db_path_from(&var),
            status,
            out: var("EXPORT_OUT").map(PathBuf::from),
            summary: var("EXPORT_SUMMARY").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }
}
