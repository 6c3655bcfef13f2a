use std::time::{Duration, Instant};

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClassifyError;
use crate::prompt::Prompt;

/// Supported chat models. Adding one means adding a variant and a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Model {
    #[default]
    #[value(name = "gpt-4o")]
    Gpt4o,
    #[value(name = "gpt-4-turbo")]
    Gpt4Turbo,
    #[value(name = "gpt-4")]
    Gpt4,
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[value(name = "o3")]
    O3,
    #[value(name = "o3-mini")]
    O3Mini,
}

/// (model, api id, USD per million input tokens, USD per million output tokens)
const MODEL_TABLE: &[(Model, &str, f64, f64)] = &[
    (Model::Gpt4o, "gpt-4o", 5.00, 15.00),
    (Model::Gpt4Turbo, "gpt-4-turbo", 10.00, 30.00),
    (Model::Gpt4, "gpt-4", 30.00, 60.00),
    (Model::Gpt35Turbo, "gpt-3.5-turbo", 0.50, 1.50),
    (Model::O3, "o3", 10.00, 40.00),
    (Model::O3Mini, "o3-mini", 1.10, 4.40),
];

impl Model {
    pub fn all() -> impl Iterator<Item = Model> {
        MODEL_TABLE.iter().map(|(m, ..)| *m)
    }

    fn row(self) -> &'static (Model, &'static str, f64, f64) {
        // every variant has a row; the table test keeps it that way
        MODEL_TABLE
            .iter()
            .find(|(m, ..)| *m == self)
            .unwrap_or(&MODEL_TABLE[0])
    }

    /// Identifier sent to the API.
    pub fn id(self) -> &'static str {
        self.row().1
    }

    /// Dropdown-style label with pricing, e.g. `gpt-4o ($5.00/$15.00)`.
    pub fn label(self) -> String {
        let (_, id, input, output) = *self.row();
        format!("{} (${:.2}/${:.2})", id, input, output)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One synchronous model call: prompt in, raw text out.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, model: Model, prompt: &Prompt) -> Result<String, ClassifyError>;
}

/// Chat-completions client.
pub struct OpenAiClassifier {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClassifier {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, model: Model, prompt: &Prompt) -> Result<String, ClassifyError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClassifyError::Config("OPENAI_API_KEY not set".into()))?;

        let start = Instant::now();
        let request = ChatRequest {
            model: model.id(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                ClassifyError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %body, "chat completion API error");
            return Err(ClassifyError::Api(format!("{}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifyError::Parse("response contained no message content".into()))?;

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis() as u64,
            "chat completion"
        );
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
