use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time;

use crate::config::ImageStoreSettings;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client of the hosted image store. Uploaded images become durably
/// retrievable at the returned URL; no local copy is kept.
pub struct ImageStoreClient {
    http_client: Client,
    // None when the image store section is missing from the configuration.
    // Every upload then degrades to a logged warning, never a crash.
    settings: Option<ImageStoreSettings>,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl ImageStoreClient {
    pub fn new(
        settings: Option<ImageStoreSettings>,
        timeout: Option<time::Duration>,
    ) -> ImageStoreClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        ImageStoreClient {
            http_client,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    /// Uploads the image and returns its durable public URL.
    ///
    /// The absence of a URL is the only failure signal: a missing
    /// configuration, a transport error and a malformed service response all
    /// come back as `None` after logging.
    #[tracing::instrument(name = "Uploading an image to the image store", skip(self, image))]
    pub async fn upload(&self, image: Vec<u8>, filename: String) -> Option<String> {
        let settings = match &self.settings {
            Some(settings) => settings,
            None => {
                tracing::warn!("Image store is not configured. Skipping the upload.");
                return None;
            }
        };

        let url = format!("{}/image/upload", settings.base_url);
        let form = Form::new().part("file", Part::bytes(image).file_name(filename));

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", settings.api_key.expose_secret()),
            )
            .multipart(form)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Failed to reach the image store: {:?}", err);
                return None;
            }
        };

        // 4xx and 5xx answers carry no usable URL
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Image store rejected the upload: {:?}", err);
                return None;
            }
        };

        match response.json::<UploadResponse>().await {
            Ok(body) => {
                tracing::info!("Image uploaded successfully: {}", body.secure_url);
                Some(body.secure_url)
            }
            Err(err) => {
                tracing::error!("Upload succeeded but the response had no URL: {:?}", err);
                None
            }
        }
    }
}
