//! Scoreline ingest: shared setup for the `ingest`, `db-stats` and
//! `export-json` binaries.

pub mod config;
pub mod export;

use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` filter, `info` when unset.
pub fn init_tracing() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();
}
