#[cfg(test)]
#[path = "prompt_resolver_test.rs"]
mod tests;

use crate::domain::models::ActivityError;
use crate::domain::models::ActivityKind;
use crate::domain::models::PromptStoreBox;
use crate::domain::models::ResolvedActivity;

pub struct PromptResolver {
    store: PromptStoreBox,
}

impl PromptResolver {
    pub fn new(store: PromptStoreBox) -> PromptResolver {
        return PromptResolver { store };
    }

    /// Looks up an activity code and returns the first record tagged for
    /// `kind`. Records for other tools, and records without a prompt, are
    /// skipped.
    pub async fn resolve(
        &self,
        code: &str,
        kind: ActivityKind,
    ) -> Result<ResolvedActivity, ActivityError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ActivityError::Validation(
                "Please enter the activity code from your teacher.".to_string(),
            ));
        }

        let records = self
            .store
            .find_by_code(code)
            .await
            .map_err(|err| return ActivityError::service("Prompt lookup", err))?;

        let record = records.into_iter().find(|record| {
            return record.kind() == Some(kind) && !record.prompt.trim().is_empty();
        });

        match record {
            Some(record) => {
                tracing::info!(code, kind = %kind, "resolved activity code");
                return Ok(ResolvedActivity {
                    kind,
                    code: code.to_string(),
                    prompt: record.prompt,
                    teacher_email: record.email.trim().to_string(),
                });
            }
            None => {
                tracing::info!(code, kind = %kind, "activity code did not resolve");
                return Err(ActivityError::NotFound);
            }
        }
    }
}
