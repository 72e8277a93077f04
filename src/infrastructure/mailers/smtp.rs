#[cfg(test)]
#[path = "smtp_test.rs"]
mod tests;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Attachment;
use lettre::message::Mailbox;
use lettre::message::MultiPart;
use lettre::message::SinglePart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::EmailMessage;
use crate::domain::models::MailError;
use crate::domain::models::Mailer;

/// Sends mail through an authenticated SMTP relay over implicit TLS.
pub struct Smtp {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl Default for Smtp {
    fn default() -> Smtp {
        return Smtp {
            host: Config::get(ConfigKey::SmtpHost),
            port: Config::get(ConfigKey::SmtpPort).parse::<u16>().unwrap_or(465),
            username: Config::get(ConfigKey::EmailAddress),
            password: Config::get(ConfigKey::EmailPassword),
        };
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    return address
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| return MailError::Address(format!("{address}: {err}")));
}

fn classify(err: lettre::transport::smtp::Error) -> MailError {
    let msg = err.to_string();
    if let Some(code) = err.status() {
        // 530, 534 and 535 are the relay refusing our credentials.
        if code.to_string().starts_with("53") {
            return MailError::Auth(msg);
        }
        return MailError::Rejected(msg);
    }

    return MailError::Network(msg);
}

impl Smtp {
    pub fn build_message(message: &EmailMessage) -> Result<Message, MailError> {
        let builder = Message::builder()
            .from(parse_mailbox(&message.from)?)
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.to_string());

        let res = match &message.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|err| return MailError::Rejected(err.to_string()))?;

                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(message.body.to_string()))
                        .singlepart(
                            Attachment::new(attachment.filename.to_string())
                                .body(attachment.bytes.clone(), content_type),
                        ),
                )
            }
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.body.to_string()),
        };

        return res.map_err(|err| return MailError::Rejected(err.to_string()));
    }
}

#[async_trait]
impl Mailer for Smtp {
    #[allow(clippy::implicit_return)]
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = Smtp::build_message(message)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(classify)?
            .port(self.port)
            .credentials(Credentials::new(
                self.username.to_string(),
                self.password.to_string(),
            ))
            .build();

        let res = transport.send(email).await.map_err(classify)?;
        tracing::debug!(code = %res.code(), "mail relay accepted message");

        return Ok(());
    }
}
