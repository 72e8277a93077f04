use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::ActivityRecord;
use super::EmailMessage;
use super::MailError;
use super::UploadedImage;

/// Read access to the teacher-maintained prompt database.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Returns every record whose `setting_name` equals `code`. A store that
    /// answers with a non-success status yields no records.
    async fn find_by_code(&self, code: &str) -> Result<Vec<ActivityRecord>>;
}

/// A multimodal model that answers a prompt about an image.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn describe_image(&self, prompt: &str, image: &UploadedImage) -> Result<String>;
}

/// A chat model answering a single user turn under a system prompt.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

/// An image model. Returns the provider's hosted URL, not the bytes.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}

/// Outbound mail relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

pub type PromptStoreBox = Arc<dyn PromptStore>;
pub type VisionBackendBox = Arc<dyn VisionBackend>;
pub type ChatBackendBox = Arc<dyn ChatBackend>;
pub type ImageBackendBox = Arc<dyn ImageBackend>;
pub type MailerBox = Arc<dyn Mailer>;
