use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A transcript for the teacher. Built per notification and dropped once
/// sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail relay rejected the login: {0}")]
    Auth(String),
    #[error("could not reach the mail relay: {0}")]
    Network(String),
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("mail relay rejected the message: {0}")]
    Rejected(String),
}

/// What happened to a transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The activity has no teacher address, nothing was sent.
    NoRecipient,
    AuthFailed(String),
    NetworkFailed(String),
    Rejected(String),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        return *self == Delivery::Delivered;
    }
}

impl From<MailError> for Delivery {
    fn from(err: MailError) -> Delivery {
        match err {
            MailError::Auth(msg) => return Delivery::AuthFailed(msg),
            MailError::Network(msg) => return Delivery::NetworkFailed(msg),
            MailError::Address(msg) | MailError::Rejected(msg) => return Delivery::Rejected(msg),
        }
    }
}
