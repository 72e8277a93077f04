//! In-memory stand-ins for the external services, used by tests to count
//! calls and script failures.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::ActivityRecord;
use crate::domain::models::ChatBackend;
use crate::domain::models::EmailMessage;
use crate::domain::models::ImageBackend;
use crate::domain::models::MailError;
use crate::domain::models::Mailer;
use crate::domain::models::PromptStore;
use crate::domain::models::UploadedImage;
use crate::domain::models::VisionBackend;
use crate::domain::services::Activities;
use crate::domain::services::Notifier;
use crate::domain::services::PromptResolver;

pub fn record(code: &str, page: &str, prompt: &str, email: &str) -> ActivityRecord {
    return ActivityRecord {
        setting_name: code.to_string(),
        page: page.to_string(),
        prompt: prompt.to_string(),
        email: email.to_string(),
    };
}

#[derive(Default)]
pub struct FakePromptStore {
    pub records: Vec<ActivityRecord>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakePromptStore {
    pub fn with_records(records: Vec<ActivityRecord>) -> FakePromptStore {
        return FakePromptStore {
            records,
            ..Default::default()
        };
    }
}

#[async_trait]
impl PromptStore for FakePromptStore {
    #[allow(clippy::implicit_return)]
    async fn find_by_code(&self, code: &str) -> Result<Vec<ActivityRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("prompt store is down");
        }

        return Ok(self
            .records
            .iter()
            .filter(|record| return record.setting_name == code)
            .cloned()
            .collect());
    }
}

#[derive(Default)]
pub struct FakeVision {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VisionBackend for FakeVision {
    #[allow(clippy::implicit_return)]
    async fn describe_image(&self, prompt: &str, image: &UploadedImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("vision model unavailable");
        }

        return Ok(format!("{prompt}: a {} picture", image.mime_type()));
    }
}

#[derive(Default)]
pub struct FakeChat {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ChatBackend for FakeChat {
    #[allow(clippy::implicit_return)]
    async fn reply(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("chat model unavailable");
        }

        return Ok(format!("  [{system_prompt}] You said: {user_text}\n"));
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub prompts: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn calls(&self) -> usize {
        return self.prompts.lock().unwrap().len();
    }
}

#[async_trait]
impl ImageBackend for FakeImages {
    #[allow(clippy::implicit_return)]
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        return Ok(format!("https://images.example.com/{}.png", prompts.len()));
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub fail_with: Option<MailError>,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl FakeMailer {
    pub fn failing(err: MailError) -> FakeMailer {
        return FakeMailer {
            fail_with: Some(err),
            ..Default::default()
        };
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        return self.sent.lock().unwrap().clone();
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    #[allow(clippy::implicit_return)]
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        self.sent.lock().unwrap().push(message.clone());
        return Ok(());
    }
}

/// Every fake wired into one `Activities`, with handles kept for assertions.
pub struct FakeServices {
    pub store: Arc<FakePromptStore>,
    pub vision: Arc<FakeVision>,
    pub chat: Arc<FakeChat>,
    pub images: Arc<FakeImages>,
    pub mailer: Arc<FakeMailer>,
}

impl FakeServices {
    pub fn new(records: Vec<ActivityRecord>) -> FakeServices {
        return FakeServices {
            store: Arc::new(FakePromptStore::with_records(records)),
            vision: Arc::new(FakeVision::default()),
            chat: Arc::new(FakeChat::default()),
            images: Arc::new(FakeImages::default()),
            mailer: Arc::new(FakeMailer::default()),
        };
    }

    pub fn activities(&self) -> Activities {
        return Activities::new(
            PromptResolver::new(self.store.clone()),
            self.vision.clone(),
            self.chat.clone(),
            self.images.clone(),
            Notifier::new(self.mailer.clone(), "tools@example.com"),
        );
    }

    pub fn store_calls(&self) -> usize {
        return self.store.calls.load(Ordering::SeqCst);
    }

    pub fn vision_calls(&self) -> usize {
        return self.vision.calls.load(Ordering::SeqCst);
    }

    pub fn chat_calls(&self) -> usize {
        return self.chat.calls.load(Ordering::SeqCst);
    }
}
