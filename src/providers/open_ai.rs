use crate::config::OpenAIConfig;
use crate::error::ProviderError;
use crate::providers::InferenceBackend;
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::path::Path;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
    transcription_model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(client: Client, config: &OpenAIConfig) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(OpenAIProvider {
            client,
            api_key,
            base_url: config.base_url.clone(),
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            transcription_model: config.transcription_model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let defaults = OpenAIConfig::default();
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            text_model: defaults.text_model,
            vision_model: defaults.vision_model,
            transcription_model: defaults.transcription_model,
        }
    }

    async fn chat(&self, body: Value) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let response_body = checked_json(response).await?;
        debug!("{:?}", response_body);
        response_body["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or(ProviderError::MalformedResponse)
    }
}

async fn checked_json(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        return Err(ProviderError::Api { status, body });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl InferenceBackend for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        self.chat(json!({
            "model": self.text_model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": max_tokens
        }))
        .await
    }

    async fn describe_image(
        &self,
        instruction: &str,
        image_base64: &str,
        mime_type: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        self.chat(json!({
            "model": self.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": instruction},
                    {
                        "type": "image_url",
                        "image_url": {"url": format!("data:{};base64,{}", mime_type, image_base64)}
                    }
                ]
            }],
            "max_tokens": max_tokens
        }))
        .await
    }

    async fn transcribe(&self, audio_path: &Path, prompt: &str) -> Result<String, ProviderError> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|source| ProviderError::Io {
                path: audio_path.to_path_buf(),
                source,
            })?;
        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("prompt", prompt.to_string())
            .part("file", Part::bytes(audio).file_name(file_name).mime_str("audio/mpeg")?);

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let response_body = checked_json(response).await?;
        debug!("{:?}", response_body);
        response_body["text"]
            .as_str()
            .map(String::from)
            .ok_or(ProviderError::MalformedResponse)
    }
}
