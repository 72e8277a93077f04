#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::UploadedImage;
use crate::domain::models::VisionBackend;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPartsBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
    InlineData(ContentPartsBlob),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<ContentParts>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    contents: Vec<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

pub struct Gemini {
    url: String,
    token: String,
    model: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            model: Config::get(ConfigKey::VisionModel),
        };
    }
}

#[async_trait]
impl VisionBackend for Gemini {
    #[allow(clippy::implicit_return)]
    async fn describe_image(&self, prompt: &str, image: &UploadedImage) -> Result<String> {
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let req = CompletionRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    ContentParts::Text(prompt.to_string()),
                    ContentParts::InlineData(ContentPartsBlob {
                        mime_type: image.mime_type().to_string(),
                        data: image.to_base64(),
                    }),
                ],
            }],
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent",
                url = self.url,
                model = self.model.trim_start_matches("models/"),
            ))
            .header("x-goog-api-key", &self.token)
            .json(&req)
            .send()
            .await
            .map_err(|err| return err.without_url())?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make generate content request to Gemini"
            );
            bail!(format!(
                "Failed to make generate content request to Gemini, {}",
                res.status().as_u16()
            ));
        }

        let body = res
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| return err.without_url())?;
        tracing::debug!(candidates = body.candidates.len(), "Generate content response");

        let text = match body.candidates.first() {
            Some(candidate) => candidate
                .content
                .parts
                .iter()
                .filter_map(|part| match part {
                    ContentParts::Text(text) => return Some(text.as_str()),
                    ContentParts::InlineData(_) => return None,
                })
                .collect::<String>(),
            None => "".to_string(),
        };

        if text.trim().is_empty() {
            bail!("Gemini returned an empty response");
        }

        return Ok(text);
    }
}
