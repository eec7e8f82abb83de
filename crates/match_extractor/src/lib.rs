//! Listing page → normalized match records.
//!
//! Rendered HTML snapshot → sport sections → match rows + league
//! heading → `MatchRecord`. One bad row never sinks the batch: rows without an
//! id are skipped silently, rows that fail to build are logged and dropped.

pub mod builder;
pub mod dialect;
pub mod locator;
pub mod parsers;
pub mod record;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use logger::{now_iso, EventLogger, ExtractionRunEvent, RowDroppedEvent};
use scraper::Html;
use std::path::Path;
use tracing::{debug, info, warn};

pub use builder::RecordBuilder;
pub use dialect::{Intent, Lookup, LookupChain, MarkupDialect};
pub use locator::{Candidate, LeagueSource, LocatedRows, LocatorTier, TreeLocator};
pub use record::{LeagueContext, MatchRecord, MatchStatus, StatusFlags};

pub const DEFAULT_SITE_ORIGIN: &str = "https://www.flashscore.pt";
pub const DEFAULT_SPORT: &str = "soccer";

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub sport: String,
    pub site_origin: String,
    /// Date clock times are anchored to. `None` = local today at extraction time.
    pub today: Option<NaiveDate>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            sport: DEFAULT_SPORT.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            today: None,
        }
    }
}

/// A row that was located but could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub row_id: Option<String>,
    pub reason: String,
}

/// Result of one extraction run. Never an `Err`: unreadable input shows up in
/// `read_error` with no records.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub source: String,
    pub tier: LocatorTier,
    pub candidates: usize,
    pub records: Vec<MatchRecord>,
    pub skipped_without_id: usize,
    pub dropped: Vec<DroppedRow>,
    pub read_error: Option<String>,
}

impl ExtractionOutcome {
    pub fn unreadable(source: impl Into<String>, error: &anyhow::Error) -> Self {
        Self {
            source: source.into(),
            tier: LocatorTier::Primary,
            candidates: 0,
            records: Vec::new(),
            skipped_without_id: 0,
            dropped: Vec::new(),
            read_error: Some(format!("{error:#}")),
        }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn used_fallback(&self) -> bool {
        self.tier == LocatorTier::Fallback
    }

    pub fn is_ok(&self) -> bool {
        self.read_error.is_none()
    }
}

pub struct MatchExtractor {
    dialect: MarkupDialect,
    options: ExtractorOptions,
    logger: EventLogger,
}

impl MatchExtractor {
    pub fn new(options: ExtractorOptions, logger: EventLogger) -> Result<Self> {
        let dialect = MarkupDialect::flashscore(&options.sport)
            .with_context(|| format!("build markup dialect for sport {:?}", options.sport))?;
        Ok(Self {
            dialect,
            options,
            logger,
        })
    }

    pub fn with_dialect(mut self, dialect: MarkupDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &MarkupDialect {
        &self.dialect
    }

    /// Read a saved snapshot from disk and extract it.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> ExtractionOutcome {
        let path = path.as_ref();
        let source = path.display().to_string();
        info!("Reading HTML file: {}", source);

        match std::fs::read_to_string(path).with_context(|| format!("read html file {source}")) {
            Ok(html) => self.extract_document(&source, &html),
            Err(e) => self.report_unreadable(&source, &e),
        }
    }

    /// Report a document the caller failed to obtain (missing file, HTTP error).
    pub fn report_unreadable(&self, source: &str, error: &anyhow::Error) -> ExtractionOutcome {
        warn!("Cannot read document {}: {:#}", source, error);
        let outcome = ExtractionOutcome::unreadable(source, error);
        self.report_run(&outcome);
        outcome
    }

    pub fn extract_document(&self, source: &str, html: &str) -> ExtractionOutcome {
        let doc = Html::parse_document(html);
        let located = TreeLocator::new(&self.dialect).locate(&doc);
        let today = self.options.today.unwrap_or_else(|| Local::now().date_naive());
        let builder = RecordBuilder::new(&self.dialect, self.options.site_origin.as_str(), today);

        let mut outcome = ExtractionOutcome {
            source: source.to_string(),
            tier: located.tier,
            candidates: located.candidates.len(),
            records: Vec::with_capacity(located.candidates.len()),
            skipped_without_id: 0,
            dropped: Vec::new(),
            read_error: None,
        };

        for candidate in &located.candidates {
            match builder.build(candidate) {
                Ok(Some(record)) => outcome.records.push(record),
                Ok(None) => outcome.skipped_without_id += 1,
                Err(e) => {
                    let row_id = candidate.row.value().attr("id").map(str::to_string);
                    warn!(
                        "Error extracting match row {}: {:#}",
                        row_id.as_deref().unwrap_or("<no id>"),
                        e
                    );
                    self.logger.report(&RowDroppedEvent {
                        ts:     now_iso(),
                        event:  "ROW_DROPPED",
                        row_id: row_id.clone(),
                        reason: format!("{e:#}"),
                    });
                    outcome.dropped.push(DroppedRow {
                        row_id,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        debug!(
            "{} candidates: {} records, {} without id, {} dropped",
            outcome.candidates,
            outcome.records.len(),
            outcome.skipped_without_id,
            outcome.dropped.len()
        );
        info!(
            "Extracted {} matches from {} ({} tier)",
            outcome.count(),
            source,
            outcome.tier.as_str()
        );
        self.report_run(&outcome);
        outcome
    }

    fn report_run(&self, outcome: &ExtractionOutcome) {
        self.logger.report(&ExtractionRunEvent {
            ts:            now_iso(),
            event:         "EXTRACTION_RUN",
            source:        outcome.source.clone(),
            locator_tier:  outcome.tier.as_str().to_string(),
            candidates:    outcome.candidates,
            extracted:     outcome.records.len(),
            skipped_no_id: outcome.skipped_without_id,
            dropped:       outcome.dropped.len(),
            read_error:    outcome.read_error.clone(),
        });
    }
}
