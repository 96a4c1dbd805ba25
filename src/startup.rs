use std::net::TcpListener;
use std::sync::Arc;

use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;

use crate::config::Settings;
use crate::image_store::ImageStoreClient;
use crate::mailer::{DisabledMailer, NewsletterMailer, SmtpMailer};
use crate::routes::{
    health_check, home, preview, schedule_newsletter, send_now, test_email, upload_image,
};
use crate::scheduler::{JobRegistry, Scheduler};
use crate::store::{PgSubscriberStore, SubscriberStore};

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        // Lazy pool: an unreachable database degrades to empty reads at
        // request time instead of failing the boot.
        let db_pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy_with(config.get_db_options());

        let store: Arc<dyn SubscriberStore> = Arc::new(PgSubscriberStore::new(db_pool));

        let mailer: Arc<dyn NewsletterMailer> = match config
            .get_sender_email()
            .map_err(|err| err.to_string())
            .and_then(|sender| {
                SmtpMailer::new(&config.email, sender, store.clone())
                    .map_err(|err| err.to_string())
            }) {
            Ok(mailer) => Arc::new(mailer),
            Err(err) => {
                tracing::warn!("Running with a disabled mailer: {}", err);
                Arc::new(DisabledMailer)
            }
        };

        let image_store = ImageStoreClient::new(config.image_store.clone(), None);
        let registry = Arc::new(JobRegistry::new());
        let scheduler = Scheduler::new(registry.clone(), store.clone(), mailer.clone());

        let listener =
            TcpListener::bind(config.get_address()).expect("Failed to bind the address.");
        let port = listener.local_addr().unwrap().port();
        let server = run(
            listener,
            store,
            mailer,
            image_store,
            registry,
            scheduler,
            config.get_secret_key(),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    listener: TcpListener,
    store: Arc<dyn SubscriberStore>,
    mailer: Arc<dyn NewsletterMailer>,
    image_store: ImageStoreClient,
    registry: Arc<JobRegistry>,
    scheduler: Scheduler,
    secret_key: Secret<String>,
) -> Result<Server, std::io::Error> {
    let store = web::Data::from(store);
    let mailer = web::Data::from(mailer);
    let image_store = web::Data::new(image_store);
    let registry = web::Data::from(registry);
    let scheduler = web::Data::new(scheduler);

    // Flash messages ride on a signed cookie, like the original's session flashes
    let message_store =
        CookieMessageStore::builder(Key::derive_from(secret_key.expose_secret().as_bytes()))
            .build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .wrap(message_framework.clone())
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(home))
            .route("/upload", web::post().to(upload_image))
            .route("/preview", web::get().to(preview))
            .route("/schedule", web::post().to(schedule_newsletter))
            .route("/send_now", web::post().to(send_now))
            .route("/test_email", web::post().to(test_email))
            .app_data(store.clone())
            .app_data(mailer.clone())
            .app_data(image_store.clone())
            .app_data(registry.clone())
            .app_data(scheduler.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
