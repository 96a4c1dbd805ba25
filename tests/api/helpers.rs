use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::Response;
use secrecy::Secret;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

use colorstack_newsletter::{
    config::{get_configuration, ImageStoreSettings},
    domain::subscriber_email::SubscriberEmail,
    mailer::{DisabledMailer, NewsletterMailer},
    scheduler::{JobRegistry, Scheduler},
    startup::{run, Application},
    store::SubscriberStore,
};

pub struct TestApp {
    pub address: String,
    pub image_server: MockServer,
    client: reqwest::Client,
}

/// Store kept in process memory with the same singleton-upsert contract as
/// the Postgres implementation, so the read-after-write path can be
/// exercised without provisioning a database.
#[derive(Default)]
pub struct InMemoryStore {
    latest_image: Mutex<Option<String>>,
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn subscriber_emails(&self) -> Vec<SubscriberEmail> {
        Vec::new()
    }

    async fn subscriber_count(&self) -> i64 {
        0
    }

    async fn store_latest_image_url(&self, url: &str) -> bool {
        // Upsert on the singleton: a write replaces the prior value
        *self.latest_image.lock().unwrap() = Some(String::from(url));
        true
    }

    async fn latest_image_url(&self) -> Option<String> {
        self.latest_image.lock().unwrap().clone()
    }
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        TestApp::spawn(true).await
    }

    /// Variant with the image store section removed from the configuration,
    /// to exercise the degraded upload path.
    pub async fn spawn_app_without_image_store() -> TestApp {
        TestApp::spawn(false).await
    }

    /// Variant wired through `startup::run` with an [`InMemoryStore`], so
    /// the upload -> preview flow can observe actual store writes.
    pub async fn spawn_app_with_store(store: Arc<InMemoryStore>) -> TestApp {
        let image_server = MockServer::start().await;
        let store: Arc<dyn SubscriberStore> = store;
        let mailer: Arc<dyn NewsletterMailer> = Arc::new(DisabledMailer);
        let image_store = colorstack_newsletter::image_store::ImageStoreClient::new(
            Some(ImageStoreSettings {
                base_url: image_server.uri(),
                api_key: Secret::new(String::from("test-key")),
            }),
            None,
        );
        let registry = Arc::new(JobRegistry::new());
        let scheduler = Scheduler::new(registry.clone(), store.clone(), mailer.clone());

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind the address.");
        let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        let secret_key = Secret::new(String::from(
            "super-long-and-secret-random-key-needed-to-sign-flash-cookies",
        ));

        let server = run(
            listener,
            store,
            mailer,
            image_store,
            registry,
            scheduler,
            secret_key,
        )
        .expect("Failed to build application.");

        tokio::spawn(server);

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        TestApp {
            address,
            image_server,
            client,
        }
    }

    async fn spawn(image_store_configured: bool) -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let image_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        // Nothing listens on these ports: every database read degrades to the
        // empty value and every SMTP send fails fast, which is exactly the
        // fault-swallowing behavior these tests exercise.
        config.database.port = 1;
        config.email.smtp_host = String::from("127.0.0.1");
        config.email.smtp_port = 1;

        if image_store_configured {
            config.set_image_store_base_url(image_server.uri());
        } else {
            config.image_store = None;
        }

        let application = Application::build(config)
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        // Redirects are left unfollowed so the tests can assert on them
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        TestApp {
            address,
            image_server,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, path: &str, body: HashMap<&str, &str>) -> Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .form(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Posts a hand-built multipart body, for malformed-payload cases the
    /// `reqwest` form builder cannot produce.
    pub async fn post_upload_body(&self, content_type: &str, body: &'static str) -> Response {
        self.client
            .post(format!("{}/upload", self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_upload(&self, filename: &str, image: Vec<u8>) -> Response {
        let form = Form::new().part(
            "file",
            Part::bytes(image).file_name(String::from(filename)),
        );

        self.client
            .post(format!("{}/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn location_header(response: &Response) -> &str {
    response
        .headers()
        .get("Location")
        .expect("Missing the Location header.")
        .to_str()
        .unwrap()
}
