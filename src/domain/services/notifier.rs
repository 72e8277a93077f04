#[cfg(test)]
#[path = "notifier_test.rs"]
mod tests;

use crate::domain::models::Attachment;
use crate::domain::models::Delivery;
use crate::domain::models::EmailMessage;
use crate::domain::models::MailerBox;
use crate::domain::models::UploadedImage;

/// What the student handed in, per tool.
#[derive(Clone, Debug)]
pub enum TranscriptDetails {
    Vision { image: UploadedImage },
    Dialogue { student_answer: String },
    ImageGeneration { descriptors: String },
}

/// Everything the teacher is told about one finished activity.
#[derive(Clone, Debug)]
pub struct Transcript {
    pub student_name: String,
    pub teacher_email: String,
    pub prompt: String,
    pub details: TranscriptDetails,
    pub result: String,
}

pub struct Notifier {
    mailer: MailerBox,
    sender: String,
}

impl Notifier {
    pub fn new(mailer: MailerBox, sender: &str) -> Notifier {
        return Notifier {
            mailer,
            sender: sender.to_string(),
        };
    }

    pub fn compose(&self, transcript: &Transcript) -> EmailMessage {
        let name = &transcript.student_name;
        let prompt = &transcript.prompt;
        let result = &transcript.result;

        let (subject, body, attachment) = match &transcript.details {
            TranscriptDetails::Vision { image } => {
                let body = format!(
                    "Student name: {name}\n\nPrompt used:\n{prompt}\n\nAI result:\n{result}\n"
                );
                let attachment = Attachment {
                    filename: format!("image.{}", image.extension()),
                    content_type: image.mime_type().to_string(),
                    bytes: image.bytes.clone(),
                };
                (format!("{name}'s AI activity result"), body, Some(attachment))
            }
            TranscriptDetails::Dialogue { student_answer } => {
                let body = format!(
                    "Student name: {name}\n\nPrompt used:\n{prompt}\n\nStudent input:\n{student_answer}\n\nAI generated dialogue:\n{result}\n"
                );
                (format!("{name}'s AI activity result"), body, None)
            }
            TranscriptDetails::ImageGeneration { descriptors } => {
                let body = format!(
                    "Student name: {name}\nTopic: {prompt}\nDescriptors: {descriptors}\n\nGenerated image URL:\n{result}\n"
                );
                (format!("{name}'s image generation result"), body, None)
            }
        };

        return EmailMessage {
            from: self.sender.to_string(),
            to: transcript.teacher_email.to_string(),
            subject,
            body,
            attachment,
        };
    }

    /// Mails the transcript to the teacher. Never fails: every relay error is
    /// reported through the returned `Delivery`.
    pub async fn notify(&self, transcript: &Transcript) -> Delivery {
        if transcript.teacher_email.trim().is_empty() {
            tracing::warn!("activity has no teacher email, skipping transcript");
            return Delivery::NoRecipient;
        }

        let message = self.compose(transcript);
        match self.mailer.send(&message).await {
            Ok(()) => {
                tracing::info!(attachment = message.attachment.is_some(), "sent transcript");
                return Delivery::Delivered;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to send transcript");
                return Delivery::from(err);
            }
        }
    }
}
