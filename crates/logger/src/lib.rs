/// Scoreline logger
/// JSONL run reports, one file per UTC day

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reporting context handed to each component explicitly.
/// `disabled()` swallows everything (tests, library callers without a log dir).
#[derive(Debug, Clone)]
pub struct EventLogger {
    log_dir: Option<PathBuf>,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: Some(dir) }
    }

    pub fn disabled() -> Self {
        Self { log_dir: None }
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let Some(dir) = &self.log_dir else {
            return Ok(());
        };
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Like `log`, but a failed write only warns. Reporting must not break the run.
    pub fn report<T: Serialize>(&self, event: &T) {
        if let Err(e) = self.log(event) {
            tracing::warn!("event log write failed: {}", e);
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ExtractionRunEvent {
    pub ts:              String,
    pub event:           &'static str,   // "EXTRACTION_RUN"
    pub source:          String,
    pub locator_tier:    String,         // "primary" | "fallback"
    pub candidates:      usize,
    pub extracted:       usize,
    pub skipped_no_id:   usize,
    pub dropped:         usize,
    pub read_error:      Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RowDroppedEvent {
    pub ts:     String,
    pub event:  &'static str,            // "ROW_DROPPED"
    pub row_id: Option<String>,
    pub reason: String,
}

#[derive(Serialize, Debug)]
pub struct UpsertFailedEvent {
    pub ts:        String,
    pub event:     &'static str,         // "UPSERT_FAILED"
    pub match_id:  String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub error:     String,
}

#[derive(Serialize, Debug)]
pub struct StoreBatchEvent {
    pub ts:             String,
    pub event:          &'static str,    // "STORE_BATCH"
    pub total:          usize,
    pub inserted:       usize,
    pub updated:        usize,
    pub failed:         usize,
    pub failed_preview: Vec<String>,
}
