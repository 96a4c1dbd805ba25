use std::sync::Arc;
use std::time;

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::{Mailbox, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::EmailSettings;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::renderer::render_newsletter;
use crate::store::SubscriberStore;

const SMTP_TIMEOUT: time::Duration = time::Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("The mail transport is not configured.")]
    NotConfigured,
    #[error("{0} is not a valid recipient address")]
    InvalidRecipient(String),
    #[error("Failed to build the email message.")]
    Message(#[from] lettre::error::Error),
    #[error("Failed to transmit the email over SMTP.")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends one rendered newsletter to one recipient.
#[async_trait]
pub trait NewsletterMailer: Send + Sync {
    async fn send(&self, recipient: &SubscriberEmail) -> Result<(), SendError>;
}

/// SMTP implementation backed by lettre.
///
/// The latest image URL is fetched fresh from the store on every call, so a
/// mid-campaign upload can reach later recipients of the same fan-out. That
/// matches the reference behavior and is accepted.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    store: Arc<dyn SubscriberStore>,
}

impl SmtpMailer {
    pub fn new(
        settings: &EmailSettings,
        sender: SubscriberEmail,
        store: Arc<dyn SubscriberStore>,
    ) -> Result<SmtpMailer, SendError> {
        let sender = parse_mailbox(&sender)?;
        // Credentials are checked by the relay at send time; a bad password
        // surfaces as a per-recipient transport failure, not a startup crash.
        let credentials = Credentials::new(
            settings.sender_email.clone(),
            settings.sender_password.expose_secret().clone(),
        );
        // No connection pool: every send opens one authenticated session.
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
            .port(settings.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(SmtpMailer {
            transport,
            sender,
            store,
        })
    }
}

#[async_trait]
impl NewsletterMailer for SmtpMailer {
    #[tracing::instrument(
        name = "Sending the newsletter to a recipient",
        skip(self),
        fields(recipient = %recipient)
    )]
    async fn send(&self, recipient: &SubscriberEmail) -> Result<(), SendError> {
        let recipient = parse_mailbox(recipient)?;
        let image_url = self.store.latest_image_url().await;
        let html_content = render_newsletter(image_url.as_deref());

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(newsletter_subject(chrono::Local::now().date_naive()))
            .singlepart(SinglePart::html(html_content))?;

        self.transport.send(message).await?;

        Ok(())
    }
}

/// Stand-in used when the sender address or SMTP relay settings are unusable.
/// Keeps the process serving requests; every send fails with a logged error.
pub struct DisabledMailer;

#[async_trait]
impl NewsletterMailer for DisabledMailer {
    async fn send(&self, recipient: &SubscriberEmail) -> Result<(), SendError> {
        tracing::warn!("Dropping the email to {}: mailer is disabled", recipient);
        Err(SendError::NotConfigured)
    }
}

fn parse_mailbox(email: &SubscriberEmail) -> Result<Mailbox, SendError> {
    email
        .as_ref()
        .parse::<Mailbox>()
        .map_err(|_| SendError::InvalidRecipient(String::from(email.as_ref())))
}

fn newsletter_subject(date: NaiveDate) -> String {
    format!("ColorStack Weekly Newsletter {}", date.format("%Y-%m-%d"))
}
