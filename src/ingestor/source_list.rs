//! Persisted source list
//!
//! The ordered list of playlist URLs, stored as a JSON array. The sync engine
//! only reads it; `add`/`remove` exist for the CLI.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone)]
pub struct SourceListStore {
    path: PathBuf,
}

impl SourceListStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the list; a missing file is an empty list
    pub async fn load(&self) -> AppResult<Vec<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, sources: &[String]) -> AppResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(sources)?;
        tokio::fs::write(&self.path, contents).await?;
        info!("Saved {} sources to {}", sources.len(), self.path.display());
        Ok(())
    }

    /// Append a URL; returns false if it was already listed
    pub async fn add(&self, url: &str) -> AppResult<bool> {
        let url = url.trim();
        if !UrlUtils::is_valid(url) {
            return Err(AppError::configuration(format!(
                "'{}' is not an http(s) URL",
                UrlUtils::obfuscate_credentials(url)
            )));
        }

        let mut sources = self.load().await?;
        if sources.iter().any(|existing| existing == url) {
            return Ok(false);
        }

        sources.push(url.to_string());
        self.save(&sources).await?;
        Ok(true)
    }

    /// Remove a URL; returns false if it was not listed
    pub async fn remove(&self, url: &str) -> AppResult<bool> {
        let url = url.trim();
        let mut sources = self.load().await?;
        let before = sources.len();
        sources.retain(|existing| existing != url);

        if sources.len() == before {
            return Ok(false);
        }

        self.save(&sources).await?;
        Ok(true)
    }
}
