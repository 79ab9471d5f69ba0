//! Channel classification
//!
//! Two completion calls per entry: an English-language gate, then a category
//! label from the fixed set in [`Category`]. Failures never propagate: a failed
//! gate means "not English" and a failed classification means `Other`, and
//! both exclude the entry from the committed feed.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::models::Category;

/// External text-completion capability
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiCompletionClient {
    pub fn new<E: Into<String>, M: Into<String>>(
        endpoint: E,
        model: M,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            timeout,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> AppResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: 0.0,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::external_service("classifier", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "classifier",
                format!("completion request failed with status {status}"),
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("classifier", format!("malformed response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AppError::external_service("classifier", "response had no content"))
    }
}

/// Prompt for the English-language gate
pub fn english_prompt(display_name: &str) -> String {
    format!(
        "Is the television channel name \"{display_name}\" in English? Answer with only Yes or No."
    )
}

/// Prompt for the category label
pub fn category_prompt(display_name: &str) -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    format!(
        "Classify the television channel \"{display_name}\" into exactly one of these categories: {}. Answer with only the category name.",
        labels.join(", ")
    )
}

pub struct CategoryClassifier {
    client: Arc<dyn CompletionClient>,
    max_tokens: u32,
}

impl CategoryClassifier {
    pub fn new(client: Arc<dyn CompletionClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// English gate; any failure answers `false`
    pub async fn is_english(&self, display_name: &str) -> bool {
        match self
            .client
            .complete(&english_prompt(display_name), self.max_tokens)
            .await
        {
            Ok(answer) => answer
                .trim()
                .trim_start_matches(|c: char| !c.is_alphanumeric())
                .to_ascii_lowercase()
                .starts_with("yes"),
            Err(e) => {
                warn!("Language check failed for '{}': {}", display_name, e);
                false
            }
        }
    }

    /// Category label; any failure or unknown label answers `Other`
    pub async fn classify(&self, display_name: &str) -> Category {
        match self
            .client
            .complete(&category_prompt(display_name), self.max_tokens)
            .await
        {
            Ok(answer) => {
                let category = Category::from_label(&answer);
                debug!("Classified '{}' as {} (raw: {:?})", display_name, category, answer);
                category
            }
            Err(e) => {
                warn!("Classification failed for '{}': {}", display_name, e);
                Category::Other
            }
        }
    }

    /// Run the gate, then classification; `None` excludes the entry
    pub async fn admit(&self, display_name: &str) -> Option<Category> {
        if !self.is_english(display_name).await {
            debug!("Excluding '{}': not English", display_name);
            return None;
        }

        match self.classify(display_name).await {
            Category::Other => {
                debug!("Excluding '{}': classified as Other", display_name);
                None
            }
            category => Some(category),
        }
    }
}
