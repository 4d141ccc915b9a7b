use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, MailerError, OutgoingEmail};
use crate::config::{EmailAddress, MailerConfig};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Implicit TLS when `smtp_secure`, STARTTLS otherwise
    pub fn new(host: &str, config: &MailerConfig) -> Result<Self, MailerError> {
        let builder = if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };

        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self { transport: builder.build() })
    }
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, MailerError> {
    let name = Some(address.name.clone()).filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, address.address.parse()?))
}

pub(crate) fn build_message(email: &OutgoingEmail) -> Result<Message, MailerError> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    Ok(builder.body(email.body.clone())?)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        let message = build_message(&email)?;
        self.transport.send(message).await?;
        tracing::info!(to = %email.to.address, subject = %email.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(name: &str, address: &str) -> EmailAddress {
        EmailAddress { name: name.to_string(), address: address.to_string() }
    }

    #[test]
    fn builds_plain_text_message() {
        let email = OutgoingEmail {
            from: address("Frame", "system@example.com"),
            to: address("", "stimpy@example.com"),
            reply_to: Some(address("Ren", "ren@example.com")),
            subject: "Reset your Frame password".to_string(),
            body: "key".to_string(),
        };
        let formatted = String::from_utf8(build_message(&email).unwrap().formatted()).unwrap();
        assert!(formatted.contains("To: stimpy@example.com"));
        assert!(formatted.contains("Reply-To: \"Ren\" <ren@example.com>") || formatted.contains("Reply-To: Ren <ren@example.com>"));
        assert!(formatted.contains("Content-Type: text/plain"));
    }

    #[test]
    fn rejects_bad_addresses() {
        let email = OutgoingEmail {
            from: address("Frame", "system@example.com"),
            to: address("", "not an address"),
            reply_to: None,
            subject: "x".to_string(),
            body: "x".to_string(),
        };
        assert!(matches!(build_message(&email), Err(MailerError::Address(_))));
    }
}
