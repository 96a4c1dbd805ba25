use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{location_header, InMemoryStore, TestApp};

use colorstack_newsletter::store::SubscriberStore;

#[tokio::test]
async fn upserting_then_reading_returns_the_uploaded_url() {
    let store = InMemoryStore::default();

    assert!(store.store_latest_image_url("https://images.test/first.png").await);
    assert_eq!(
        store.latest_image_url().await.as_deref(),
        Some("https://images.test/first.png")
    );

    // Repeating the same URL is safe and leaves the same value readable
    assert!(store.store_latest_image_url("https://images.test/first.png").await);
    assert_eq!(
        store.latest_image_url().await.as_deref(),
        Some("https://images.test/first.png")
    );

    // A new upload replaces the prior value: the record is a singleton
    assert!(store.store_latest_image_url("https://images.test/second.png").await);
    assert_eq!(
        store.latest_image_url().await.as_deref(),
        Some("https://images.test/second.png")
    );
}

#[tokio::test]
async fn an_uploaded_image_is_readable_on_the_next_preview() {
    let store = Arc::new(InMemoryStore::default());
    let test_app = TestApp::spawn_app_with_store(store.clone()).await;

    Mock::given(method("POST"))
        .and(path("/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "secure_url": "https://images.test/weekly.png"
        })))
        .expect(1)
        .mount(&test_app.image_server)
        .await;

    let response = test_app
        .post_upload("newsletter.png", vec![137, 80, 78, 71])
        .await;

    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(
        location_header(&response),
        "/preview?image_url=https%3A%2F%2Fimages.test%2Fweekly.png"
    );

    // The write is immediately visible: a parameterless preview picks the
    // stored latest image, not the default fallback
    let preview = test_app.get("/preview").await.text().await.unwrap();

    assert!(preview.contains(r#"src="https://images.test/weekly.png""#));
    assert!(!preview.contains("ColorStack__QC_May_Newsletter.png"));
}
