pub mod backends;
#[cfg(test)]
pub mod fakes;
pub mod mailers;

use std::sync::Arc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::Activities;
use crate::domain::services::Notifier;
use crate::domain::services::PromptResolver;

pub struct ServiceManager {}

impl ServiceManager {
    /// Wires the configured external services into the activity executors.
    pub fn activities() -> Activities {
        let openai = Arc::new(backends::openai::OpenAI::default());

        return Activities::new(
            PromptResolver::new(Arc::<backends::notion::Notion>::default()),
            Arc::<backends::gemini::Gemini>::default(),
            openai.clone(),
            openai,
            Notifier::new(
                Arc::<mailers::smtp::Smtp>::default(),
                &Config::get(ConfigKey::EmailAddress),
            ),
        );
    }
}
