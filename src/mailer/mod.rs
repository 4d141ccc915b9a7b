pub mod smtp;
pub mod templates;

use askama::Template;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{self, EmailAddress};

pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Addressing for one outgoing email; the sender is always the system address
#[derive(Debug, Clone)]
pub struct EmailOptions {
    pub subject: String,
    pub to: EmailAddress,
    pub reply_to: Option<EmailAddress>,
}

/// A rendered email ready for a transport
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: EmailAddress,
    pub to: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, email: OutgoingEmail) -> Result<(), MailerError>;
}

/// Render `template` and hand it to `mailer` from the configured system address
pub async fn send_email<T: Template>(mailer: &dyn Mailer, options: EmailOptions, template: &T) -> Result<(), MailerError> {
    let body = template.render()?;
    let email = OutgoingEmail {
        from: config::config().system.from_address.clone(),
        to: options.to,
        reply_to: options.reply_to,
        subject: options.subject,
        body,
    };
    mailer.deliver(email).await
}

/// Writes mail to the log instead of sending it; used when no SMTP host is configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        tracing::info!(
            to = %email.to.address,
            subject = %email.subject,
            "Mail delivery disabled, logging message instead"
        );
        tracing::debug!("{}", email.body);
        Ok(())
    }
}

/// SMTP when a host is configured, otherwise the log
pub fn from_config() -> Result<std::sync::Arc<dyn Mailer>, MailerError> {
    let mailer_config = &config::config().mailer;
    match &mailer_config.smtp_host {
        Some(host) => Ok(std::sync::Arc::new(SmtpMailer::new(host, mailer_config)?)),
        None => Ok(std::sync::Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMailer;

    #[tokio::test]
    async fn sends_from_the_system_address() {
        let mailer = RecordingMailer::default();
        let options = EmailOptions {
            subject: "Frame contact form".to_string(),
            to: config::config().system.to_address.clone(),
            reply_to: Some(EmailAddress {
                name: "Ren".to_string(),
                address: "ren@stimpy.show".to_string(),
            }),
        };
        let template = templates::ContactEmail {
            name: "Ren",
            email: "ren@stimpy.show",
            message: "You eediot!",
        };

        send_email(&mailer, options, &template).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from.address, config::config().system.from_address.address);
        assert_eq!(sent[0].reply_to.as_ref().map(|r| r.address.as_str()), Some("ren@stimpy.show"));
        assert!(sent[0].body.contains("You eediot!"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let email = OutgoingEmail {
            from: config::config().system.from_address.clone(),
            to: config::config().system.to_address.clone(),
            reply_to: None,
            subject: "hello".to_string(),
            body: "body".to_string(),
        };
        assert!(LogMailer.deliver(email).await.is_ok());
    }
}
