#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatBackend;
use crate::domain::models::ImageBackend;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageRequest {
    model: String,
    prompt: String,
    size: String,
    quality: String,
    n: u32,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageDataResponse {
    #[serde(default)]
    url: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDataResponse>,
}

/// OpenAI client used for both dialogue and image generation.
pub struct OpenAI {
    url: String,
    token: String,
    chat_model: String,
    image_model: String,
    image_size: String,
    image_quality: String,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            chat_model: Config::get(ConfigKey::ChatModel),
            image_model: Config::get(ConfigKey::ImageModel),
            image_size: Config::get(ConfigKey::ImageSize),
            image_quality: Config::get(ConfigKey::ImageQuality),
        };
    }
}

impl OpenAI {
    fn check_token(&self) -> Result<()> {
        if self.token.is_empty() {
            bail!("OpenAI token is not defined");
        }

        return Ok(());
    }
}

#[async_trait]
impl ChatBackend for OpenAI {
    #[allow(clippy::implicit_return)]
    async fn reply(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        self.check_token()?;

        let req = CompletionRequest {
            model: self.chat_model.to_string(),
            messages: vec![
                MessageRequest {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                MessageRequest {
                    role: "user".to_string(),
                    content: user_text.to_string(),
                },
            ],
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to OpenAI"
            );
            bail!(format!(
                "Failed to make completion request to OpenAI, {}",
                res.status().as_u16()
            ));
        }

        let body = res.json::<CompletionResponse>().await?;
        tracing::debug!(choices = body.choices.len(), "Completion response");

        match body.choices.into_iter().next() {
            Some(choice) => return Ok(choice.message.content.trim().to_string()),
            None => bail!("OpenAI returned no completion choices"),
        }
    }
}

#[async_trait]
impl ImageBackend for OpenAI {
    #[allow(clippy::implicit_return)]
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        self.check_token()?;

        let req = ImageRequest {
            model: self.image_model.to_string(),
            prompt: prompt.to_string(),
            size: self.image_size.to_string(),
            quality: self.image_quality.to_string(),
            n: 1,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/images/generations", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make image generation request to OpenAI"
            );
            bail!(format!(
                "Failed to make image generation request to OpenAI, {}",
                res.status().as_u16()
            ));
        }

        let body = res.json::<ImageResponse>().await?;
        match body.data.into_iter().find(|image| return !image.url.is_empty()) {
            Some(image) => return Ok(image.url),
            None => bail!("OpenAI returned no image URL"),
        }
    }
}
