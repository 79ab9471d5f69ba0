//! In-process stand-ins for the network capabilities, used by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::{AppError, AppResult, SourceError};
use crate::services::classifier::CompletionClient;
use crate::utils::url::UrlUtils;
use crate::utils::{FetchResponse, HttpFetcher};

/// Canned responses keyed by `url` or `url?k=v&k=v`; anything not
/// registered behaves like a timeout
#[derive(Default)]
pub struct StubFetcher {
    gets: HashMap<String, FetchResponse>,
    heads: HashMap<String, u16>,
    get_calls: AtomicUsize,
    head_calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(mut self, key: &str, status: u16, body: &str) -> Self {
        self.gets
            .insert(key.to_string(), FetchResponse::new(status, body));
        self
    }

    pub fn with_head(mut self, url: &str, status: u16) -> Self {
        self.heads.insert(url.to_string(), status);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn key(url: &str, query: &[(&str, &str)]) -> String {
        if query.is_empty() {
            return url.to_string();
        }
        let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{url}?{}", pairs.join("&"))
    }
}

#[async_trait]
impl HttpFetcher for StubFetcher {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        _timeout: Duration,
    ) -> AppResult<FetchResponse> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.gets
            .get(&Self::key(url, query))
            .cloned()
            .ok_or_else(|| {
                AppError::Source(SourceError::Timeout {
                    url: UrlUtils::obfuscate_credentials(url),
                })
            })
    }

    async fn head(&self, url: &str, _timeout: Duration) -> AppResult<u16> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.heads.get(url).copied().ok_or_else(|| {
            AppError::Source(SourceError::Timeout {
                url: UrlUtils::obfuscate_credentials(url),
            })
        })
    }
}

/// Completion stub answering exact prompts; unknown prompts fail
#[derive(Default)]
pub struct StubCompletion {
    replies: HashMap<String, Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, prompt: &str, reply: &str) -> Self {
        self.replies
            .insert(prompt.to_string(), Ok(reply.to_string()));
        self
    }

    pub fn fail(mut self, prompt: &str) -> Self {
        self.replies
            .insert(prompt.to_string(), Err("stubbed failure".to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> AppResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.replies.get(prompt) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(message)) => Err(AppError::external_service("stub", message.clone())),
            None => Err(AppError::external_service("stub", "unexpected prompt")),
        }
    }
}
