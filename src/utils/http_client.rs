use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppError, AppResult, SourceError};
use crate::utils::url::UrlUtils;
use crate::utils::{CompressionFormat, DecompressionService};

const USER_AGENT: &str = concat!("playlist-sync/", env!("CARGO_PKG_VERSION"));

/// Status and decoded body of a GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new<B: Into<String>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| AppError::parse_error("json", format!("Failed to parse JSON: {e}")))
    }
}

/// HTTP capability used by every network-facing service
///
/// Non-success statuses are returned, not raised; only transport failures
/// (connect errors, timeouts, unreadable bodies) become errors.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` with optional query parameters
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> AppResult<FetchResponse>;

    /// HEAD `url`, returning only the status code
    async fn head(&self, url: &str, timeout: Duration) -> AppResult<u16>;
}

/// Default implementation of HttpFetcher using reqwest
///
/// Bodies are decompressed when their magic bytes show gzip, since many
/// published playlists and guides are served as `.gz` files without a
/// `Content-Encoding` header.
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }

    fn map_transport_error(error: reqwest::Error, url: &str) -> AppError {
        if error.is_timeout() {
            return AppError::Source(SourceError::Timeout {
                url: UrlUtils::obfuscate_credentials(url),
            });
        }

        AppError::ExternalService {
            service: "http_client".to_string(),
            message: UrlUtils::obfuscate_credentials(&error.to_string()),
        }
    }
}

#[async_trait]
impl HttpFetcher for StandardHttpClient {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> AppResult<FetchResponse> {
        debug!("GET {}", UrlUtils::obfuscate_credentials(url));

        let mut request = self.client.get(url).timeout(timeout);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, url))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(e, url))?;

        let compression_format = DecompressionService::detect_compression_format(&bytes);
        let decompressed = match compression_format {
            CompressionFormat::Uncompressed => bytes.to_vec(),
            _ => {
                debug!("Content is compressed ({:?}), decompressing", compression_format);
                DecompressionService::decompress(bytes)?
            }
        };

        let body = String::from_utf8_lossy(&decompressed).into_owned();
        debug!(
            "Fetched {} bytes from {} (status {})",
            body.len(),
            UrlUtils::obfuscate_credentials(url),
            status
        );

        Ok(FetchResponse { status, body })
    }

    async fn head(&self, url: &str, timeout: Duration) -> AppResult<u16> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, url))?;

        Ok(response.status().as_u16())
    }
}
