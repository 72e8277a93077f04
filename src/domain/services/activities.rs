#[cfg(test)]
#[path = "activities_test.rs"]
mod tests;

use super::Notifier;
use super::PromptResolver;
use super::Transcript;
use super::TranscriptDetails;
use crate::domain::models::ActivityError;
use crate::domain::models::ActivityKind;
use crate::domain::models::ChatBackendBox;
use crate::domain::models::Delivery;
use crate::domain::models::DescriptorSelection;
use crate::domain::models::ImageBackendBox;
use crate::domain::models::ResolvedActivity;
use crate::domain::models::UploadedImage;
use crate::domain::models::VisionBackendBox;

pub const STUDENT_NAME_MAX_CHARS: usize = 50;

/// Output of a finished activity along with what happened to its transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed {
    pub output: String,
    pub delivery: Delivery,
}

/// The three activity executors sharing one resolver and notifier.
pub struct Activities {
    pub resolver: PromptResolver,
    vision: VisionBackendBox,
    chat: ChatBackendBox,
    images: ImageBackendBox,
    notifier: Notifier,
}

impl Activities {
    pub fn new(
        resolver: PromptResolver,
        vision: VisionBackendBox,
        chat: ChatBackendBox,
        images: ImageBackendBox,
        notifier: Notifier,
    ) -> Activities {
        return Activities {
            resolver,
            vision,
            chat,
            images,
            notifier,
        };
    }

    pub fn check_student_name(name: &str) -> Result<String, ActivityError> {
        let name = name.trim();
        if name.chars().count() > STUDENT_NAME_MAX_CHARS {
            return Err(ActivityError::Validation(format!(
                "Student name must be at most {STUDENT_NAME_MAX_CHARS} characters."
            )));
        }

        return Ok(name.to_string());
    }

    fn check_kind(activity: &ResolvedActivity, kind: ActivityKind) -> Result<(), ActivityError> {
        if activity.kind != kind {
            return Err(ActivityError::NotFound);
        }

        return Ok(());
    }

    pub async fn run_vision(
        &self,
        student_name: &str,
        activity: &ResolvedActivity,
        image: &UploadedImage,
    ) -> Result<Completed, ActivityError> {
        Activities::check_kind(activity, ActivityKind::Vision)?;

        let output = self
            .vision
            .describe_image(&activity.prompt, image)
            .await
            .map_err(|err| return ActivityError::service("Image analysis", err))?;

        let delivery = self
            .notifier
            .notify(&Transcript {
                student_name: student_name.to_string(),
                teacher_email: activity.teacher_email.to_string(),
                prompt: activity.prompt.to_string(),
                details: TranscriptDetails::Vision {
                    image: image.clone(),
                },
                result: output.to_string(),
            })
            .await;

        return Ok(Completed { output, delivery });
    }

    pub async fn run_dialogue(
        &self,
        student_name: &str,
        activity: &ResolvedActivity,
        student_text: &str,
    ) -> Result<Completed, ActivityError> {
        Activities::check_kind(activity, ActivityKind::Dialogue)?;
        if student_text.trim().is_empty() {
            return Err(ActivityError::Validation(
                "Please write your answer first.".to_string(),
            ));
        }

        let output = self
            .chat
            .reply(&activity.prompt, student_text)
            .await
            .map_err(|err| return ActivityError::service("Dialogue generation", err))?
            .trim()
            .to_string();

        let delivery = self
            .notifier
            .notify(&Transcript {
                student_name: student_name.to_string(),
                teacher_email: activity.teacher_email.to_string(),
                prompt: activity.prompt.to_string(),
                details: TranscriptDetails::Dialogue {
                    student_answer: student_text.to_string(),
                },
                result: output.to_string(),
            })
            .await;

        return Ok(Completed { output, delivery });
    }

    /// Generates one image from the teacher prompt plus the chosen
    /// descriptors. The output is the provider-hosted image URL.
    pub async fn run_image(
        &self,
        student_name: &str,
        activity: &ResolvedActivity,
        descriptors: &DescriptorSelection,
    ) -> Result<Completed, ActivityError> {
        Activities::check_kind(activity, ActivityKind::ImageGeneration)?;
        if descriptors.is_empty() {
            return Err(ActivityError::Validation(
                "Select at least one describing word.".to_string(),
            ));
        }

        let combined_prompt = descriptors.combine_with(&activity.prompt);
        tracing::debug!(prompt = combined_prompt, "requesting image");

        let output = self
            .images
            .generate_image(&combined_prompt)
            .await
            .map_err(|err| return ActivityError::service("Image generation", err))?;

        let delivery = self
            .notifier
            .notify(&Transcript {
                student_name: student_name.to_string(),
                teacher_email: activity.teacher_email.to_string(),
                prompt: activity.prompt.to_string(),
                details: TranscriptDetails::ImageGeneration {
                    descriptors: descriptors.concept(),
                },
                result: output.to_string(),
            })
            .await;

        return Ok(Completed { output, delivery });
    }
}
