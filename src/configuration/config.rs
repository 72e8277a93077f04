#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::ActivityKind;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ChatModel,
    ConfigFile,
    EmailAddress,
    EmailPassword,
    GeminiToken,
    GeminiURL,
    Host,
    ImageModel,
    ImageQuality,
    ImageSize,
    NotionDatabaseID,
    NotionToken,
    NotionURL,
    NotionVersion,
    #[strum(serialize = "openai-token")]
    OpenAiToken,
    #[strum(serialize = "openai-url")]
    OpenAiURL,
    Port,
    SmtpHost,
    SmtpPort,
    VisionModel,
}

impl ConfigKey {
    /// Keys holding credentials. Their values are never printed or logged.
    pub fn is_secret(&self) -> bool {
        return matches!(
            self,
            ConfigKey::EmailPassword
                | ConfigKey::GeminiToken
                | ConfigKey::NotionToken
                | ConfigKey::OpenAiToken
        );
    }

    /// Credentials every activity page needs to look up prompts and mail
    /// transcripts.
    pub fn shared_credentials() -> Vec<ConfigKey> {
        return vec![
            ConfigKey::NotionToken,
            ConfigKey::NotionDatabaseID,
            ConfigKey::EmailAddress,
            ConfigKey::EmailPassword,
        ];
    }

    pub fn credentials_for(kind: ActivityKind) -> Vec<ConfigKey> {
        let mut keys = ConfigKey::shared_credentials();
        match kind {
            ActivityKind::Vision => keys.push(ConfigKey::GeminiToken),
            ActivityKind::Dialogue | ActivityKind::ImageGeneration => {
                keys.push(ConfigKey::OpenAiToken)
            }
        }

        return keys;
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = match dirs::config_dir() {
            Some(dir) => dir.join("classroom-ai/config.toml"),
            None => path::PathBuf::from(env::var("HOME").unwrap_or_else(|_| return ".".to_string()))
                .join(".config/classroom-ai/config.toml"),
        };

        let res = match key {
            ConfigKey::ChatModel => "gpt-4o-mini",
            ConfigKey::EmailAddress => "",
            ConfigKey::EmailPassword => "",
            ConfigKey::GeminiToken => "",
            ConfigKey::GeminiURL => "https://generativelanguage.googleapis.com",
            ConfigKey::Host => "127.0.0.1",
            ConfigKey::ImageModel => "dall-e-3",
            ConfigKey::ImageQuality => "standard",
            ConfigKey::ImageSize => "1024x1024",
            ConfigKey::NotionDatabaseID => "",
            ConfigKey::NotionToken => "",
            ConfigKey::NotionURL => "https://api.notion.com",
            ConfigKey::NotionVersion => "2022-06-28",
            ConfigKey::OpenAiToken => "",
            ConfigKey::OpenAiURL => "https://api.openai.com",
            ConfigKey::Port => "8080",
            ConfigKey::SmtpHost => "smtp.gmail.com",
            ConfigKey::SmtpPort => "465",
            ConfigKey::VisionModel => "gemini-1.5-flash",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    /// Returns the keys an activity page requires that hold no value.
    pub fn missing_for(kind: ActivityKind) -> Vec<ConfigKey> {
        return ConfigKey::credentials_for(kind)
            .into_iter()
            .filter(|key| return Config::get(*key).trim().is_empty())
            .collect();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        if !arg.get_possible_values().is_empty() {
                            possible_values = arg
                                .get_possible_values()
                                .iter()
                                .map(|e| return e.get_name().to_string())
                                .collect::<Vec<String>>();
                        }
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    } else {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}', expected a string or integer"
                        ));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        if Config::get(ConfigKey::Port).parse::<u16>().is_err() {
            bail!(format!(
                "Port must be a number between 0 and 65535, got '{}'",
                Config::get(ConfigKey::Port)
            ));
        }
        if Config::get(ConfigKey::SmtpPort).parse::<u16>().is_err() {
            bail!(format!(
                "SMTP port must be a number between 0 and 65535, got '{}'",
                Config::get(ConfigKey::SmtpPort)
            ));
        }

        tracing::debug!(
            host = Config::get(ConfigKey::Host),
            port = Config::get(ConfigKey::Port),
            vision_model = Config::get(ConfigKey::VisionModel),
            chat_model = Config::get(ConfigKey::ChatModel),
            image_model = Config::get(ConfigKey::ImageModel),
            smtp_host = Config::get(ConfigKey::SmtpHost),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
