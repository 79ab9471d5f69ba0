//! Channel artwork resolution
//!
//! Three chained MediaWiki API lookups:
//!
//! 1. full-text search for `"<name> television channel logo"`, first hit's title
//! 2. images used on that page, first image title
//! 3. direct file URL of that image
//!
//! The first hop that returns nothing or fails ends the chain and the
//! deterministic `<logo_base_url><id>.png` fallback is used instead. No retries.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::utils::HttpFetcher;

/// Fallback logo for an entry id; empty when the id is empty
pub fn fallback_logo_url(logo_base_url: &str, id: &str) -> String {
    if id.is_empty() {
        String::new()
    } else {
        format!("{logo_base_url}{id}.png")
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    search: Vec<TitledItem>,
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPage {
    #[serde(default)]
    images: Vec<TitledItem>,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct TitledItem {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
}

pub struct ArtworkResolver {
    http_client: Arc<dyn HttpFetcher>,
    search_endpoint: String,
    logo_base_url: String,
    timeout: Duration,
}

impl ArtworkResolver {
    pub fn new<S: Into<String>, L: Into<String>>(
        http_client: Arc<dyn HttpFetcher>,
        search_endpoint: S,
        logo_base_url: L,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            search_endpoint: search_endpoint.into(),
            logo_base_url: logo_base_url.into(),
            timeout,
        }
    }

    /// Logo URL for an entry, or the id-based fallback
    pub async fn resolve_logo(&self, display_name: &str, id: &str) -> String {
        match self.lookup(display_name).await {
            Ok(Some(url)) => {
                debug!("Resolved logo for '{}': {}", display_name, url);
                url
            }
            Ok(None) => {
                debug!("No artwork found for '{}', using fallback", display_name);
                fallback_logo_url(&self.logo_base_url, id)
            }
            Err(e) => {
                debug!("Artwork lookup for '{}' failed: {}", display_name, e);
                fallback_logo_url(&self.logo_base_url, id)
            }
        }
    }

    /// Run the three hops, stopping at the first empty result
    pub async fn lookup(&self, display_name: &str) -> AppResult<Option<String>> {
        let search = format!("{display_name} television channel logo");
        let Some(page_title) = self.first_search_title(&search).await? else {
            return Ok(None);
        };
        let Some(image_title) = self.first_image_title(&page_title).await? else {
            return Ok(None);
        };
        self.image_url(&image_title).await
    }

    async fn first_search_title(&self, search: &str) -> AppResult<Option<String>> {
        let response = self
            .query(&[("list", "search"), ("srsearch", search), ("srlimit", "1")])
            .await?;

        Ok(response
            .query
            .and_then(|query| query.search.into_iter().next())
            .map(|hit| hit.title))
    }

    async fn first_image_title(&self, page_title: &str) -> AppResult<Option<String>> {
        let response = self
            .query(&[("titles", page_title), ("prop", "images"), ("imlimit", "1")])
            .await?;

        Ok(response
            .query
            .and_then(|query| query.pages.into_iter().next())
            .and_then(|page| page.images.into_iter().next())
            .map(|image| image.title))
    }

    async fn image_url(&self, image_title: &str) -> AppResult<Option<String>> {
        let response = self
            .query(&[("titles", image_title), ("prop", "imageinfo"), ("iiprop", "url")])
            .await?;

        Ok(response
            .query
            .and_then(|query| query.pages.into_iter().next())
            .and_then(|page| page.imageinfo.into_iter().next())
            .map(|info| info.url)
            .filter(|url| !url.is_empty()))
    }

    async fn query(&self, params: &[(&str, &str)]) -> AppResult<ApiResponse> {
        let mut query: Vec<(&str, &str)> =
            vec![("action", "query"), ("format", "json"), ("formatversion", "2")];
        query.extend_from_slice(params);

        let response = self
            .http_client
            .get(&self.search_endpoint, &query, self.timeout)
            .await?;

        if !response.is_success() {
            return Err(AppError::http_status(response.status, "knowledge-base lookup"));
        }

        response.json()
    }
}
