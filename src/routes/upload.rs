use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use futures_util::TryStreamExt;

use crate::image_store::ImageStoreClient;
use crate::store::SubscriberStore;
use crate::utils::see_other;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Receives the newsletter image, pushes it to the image store and persists
/// the returned URL as the latest newsletter image.
///
/// Unsupported extensions and empty uploads are rejected before any network
/// call is made.
#[tracing::instrument(name = "Upload handler", skip_all)]
pub async fn upload_image(
    mut payload: Multipart,
    image_store: web::Data<ImageStoreClient>,
    store: web::Data<dyn SubscriberStore>,
) -> HttpResponse {
    let mut filename = None;
    let mut image = Vec::new();

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::error!("Failed to read the multipart payload: {:?}", err);
                FlashMessage::error("Invalid upload request").send();
                return see_other("/");
            }
        };

        if field.name() != "file" {
            continue;
        }

        filename = field
            .content_disposition()
            .get_filename()
            .map(String::from);

        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => image.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(err) => {
                    // A truncated body must never reach the image store
                    tracing::error!("Failed to read the uploaded file: {:?}", err);
                    FlashMessage::error("Invalid upload request").send();
                    return see_other("/");
                }
            }
        }
    }

    let filename = match filename {
        Some(filename) if !filename.is_empty() => filename,
        _ => {
            FlashMessage::error("No file selected").send();
            return see_other("/");
        }
    };

    if !allowed_file(&filename) {
        FlashMessage::error("Invalid file type. Please upload PNG, JPG, JPEG, or GIF files.")
            .send();
        return see_other("/");
    }

    if image.is_empty() {
        FlashMessage::error("No file selected").send();
        return see_other("/");
    }

    if !image_store.is_configured() {
        FlashMessage::error("Image store is not configured. Check the image_store settings.")
            .send();
        return see_other("/");
    }

    let image_url = match image_store.upload(image, filename).await {
        Some(url) => url,
        None => {
            FlashMessage::error("Failed to upload image to the image store").send();
            return see_other("/");
        }
    };

    if store.store_latest_image_url(&image_url).await {
        FlashMessage::info("Image uploaded successfully and ready for email!").send();
    } else {
        FlashMessage::warning("Image uploaded but failed to save URL").send();
    }

    see_other(&format!(
        "/preview?image_url={}",
        urlencoding::encode(&image_url)
    ))
}
