use anyhow::{Context, Result};
use match_extractor::MatchRecord;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::browser_client;

pub const TEAM_LOGO_FOLDER: &str = "teams";
const DEFAULT_EXTENSION: &str = ".png";

/// Rewrites a remote image URL to a local reference.
/// `None` means "keep the original URL".
pub trait ImageCache {
    fn localize(&self, url: &str, folder: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Images stored under `<root>/<folder>/<sha256(url)><ext>`, served as
/// `/images/<folder>/<file>`.
pub struct DiskImageCache {
    root: PathBuf,
    client: reqwest::Client,
}

impl DiskImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: browser_client(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn download(&self, url: &str, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("image request failed for {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP {} for {}", status, url));
        }
        let bytes = resp.bytes().await.context("read image body")?;

        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("write {}", target.display()))?;
        info!("Downloaded image {} -> {}", url, target.display());
        Ok(())
    }
}

impl ImageCache for DiskImageCache {
    async fn localize(&self, url: &str, folder: &str) -> Option<String> {
        if !is_remote(url) {
            return None;
        }

        let file_name = cache_file_name(url);
        let target = self.root.join(folder).join(&file_name);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Some(public_path(folder, &file_name));
        }

        match self.download(url, &target).await {
            Ok(()) => Some(public_path(folder, &file_name)),
            Err(e) => {
                warn!("Failed to cache image {}: {:#}", url, e);
                None
            }
        }
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// `<sha256 hex of url><ext>`; extension taken from the URL path, `.png` if none.
pub fn cache_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{:x}{}", digest, url_extension(url))
}

fn url_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();

    match last.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

pub fn public_path(folder: &str, file_name: &str) -> String {
    format!("/images/{folder}/{file_name}")
}

/// Replace team logo URLs with cached local paths where the cache succeeds.
pub async fn localize_logos<C: ImageCache>(records: &mut [MatchRecord], cache: &C) -> usize {
    let mut replaced = 0;
    for record in records.iter_mut() {
        for logo in [&mut record.home_team_logo_url, &mut record.away_team_logo_url] {
            let Some(url) = logo.as_deref() else {
                continue;
            };
            if let Some(local) = cache.localize(url, TEAM_LOGO_FOLDER).await {
                *logo = Some(local);
                replaced += 1;
            }
        }
    }
    replaced
}
