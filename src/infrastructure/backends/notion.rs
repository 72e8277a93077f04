#[cfg(test)]
#[path = "notion_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ActivityRecord;
use crate::domain::models::PromptStore;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TextEquals {
    equals: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PropertyFilter {
    property: String,
    rich_text: TextEquals,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QueryRequest {
    filter: PropertyFilter,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TextContent {
    #[serde(default)]
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
    #[serde(default)]
    text: Option<TextContent>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Property {
    #[serde(default)]
    rich_text: Vec<RichText>,
}

impl Property {
    /// Content of the first rich text run, as typed into the database.
    fn content(&self) -> Option<String> {
        let first = self.rich_text.first()?;
        return match &first.text {
            Some(text) => Some(text.content.to_string()),
            None => Some(first.plain_text.to_string()),
        };
    }

    /// Rendered text of the first rich text run. Email cells are read this
    /// way so that mention or link runs still yield the address.
    fn plain_text(&self) -> Option<String> {
        return self
            .rich_text
            .first()
            .map(|first| return first.plain_text.to_string());
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Page {
    #[serde(default)]
    properties: HashMap<String, Property>,
}

impl Page {
    fn property(&self, name: &str) -> Option<&Property> {
        return self.properties.get(name);
    }

    fn into_record(self, code: &str) -> Option<ActivityRecord> {
        let page = self.property("page")?.content()?;
        let prompt = self.property("prompt")?.content()?;
        let email = self
            .property("email")
            .and_then(|email| return email.plain_text())
            .unwrap_or_default();
        let setting_name = self
            .property("setting_name")
            .and_then(|name| return name.content())
            .unwrap_or_else(|| return code.to_string());

        return Some(ActivityRecord {
            setting_name,
            page,
            prompt,
            email,
        });
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
}

/// Prompt store backed by a Notion database with `setting_name`, `page`,
/// `prompt` and `email` rich text columns.
pub struct Notion {
    url: String,
    token: String,
    database_id: String,
    version: String,
}

impl Default for Notion {
    fn default() -> Notion {
        return Notion {
            url: Config::get(ConfigKey::NotionURL),
            token: Config::get(ConfigKey::NotionToken),
            database_id: Config::get(ConfigKey::NotionDatabaseID),
            version: Config::get(ConfigKey::NotionVersion),
        };
    }
}

#[async_trait]
impl PromptStore for Notion {
    #[allow(clippy::implicit_return)]
    async fn find_by_code(&self, code: &str) -> Result<Vec<ActivityRecord>> {
        let req = QueryRequest {
            filter: PropertyFilter {
                property: "setting_name".to_string(),
                rich_text: TextEquals {
                    equals: code.to_string(),
                },
            },
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1/databases/{id}/query",
                url = self.url,
                id = self.database_id
            ))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Notion database query failed"
            );
            return Ok(vec![]);
        }

        let body = res.json::<QueryResponse>().await?;
        let total = body.results.len();
        let records = body
            .results
            .into_iter()
            .filter_map(|page| return page.into_record(code))
            .collect::<Vec<ActivityRecord>>();

        if records.len() < total {
            tracing::warn!(
                skipped = total - records.len(),
                "Notion rows without page or prompt were skipped"
            );
        }

        return Ok(records);
    }
}
