use std::sync::Arc;

use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::mailer::NewsletterMailer;
use crate::utils::see_other;

#[derive(Deserialize, Debug)]
pub struct TestEmailForm {
    test_email: Option<String>,
}

/// Sends one newsletter to a single address so the operator can check the
/// formatting before a full send. Fire-and-forget: the send runs on its own
/// task and is never tracked in the job registry.
#[tracing::instrument(name = "Test email handler", skip(mailer))]
pub async fn test_email(
    form: web::Form<TestEmailForm>,
    mailer: web::Data<dyn NewsletterMailer>,
) -> HttpResponse {
    let address = match form.into_inner().test_email {
        Some(address) if !address.is_empty() => address,
        _ => {
            FlashMessage::error("Please provide test email").send();
            return see_other("/");
        }
    };

    let recipient = match SubscriberEmail::parse(address) {
        Ok(recipient) => recipient,
        Err(err) => {
            tracing::warn!("Rejected test email address: {}", err);
            FlashMessage::error("Please provide a valid test email").send();
            return see_other("/");
        }
    };

    FlashMessage::info(format!(
        "Test email is being sent to {}. Check your inbox in a few moments.",
        recipient
    ))
    .send();

    let mailer: Arc<dyn NewsletterMailer> = mailer.into_inner();
    tokio::spawn(async move {
        match mailer.send(&recipient).await {
            Ok(()) => tracing::info!("Test email successfully sent to {}", recipient),
            Err(err) => tracing::error!("Error sending test email to {}: {:?}", recipient, err),
        }
    });

    see_other("/")
}
