use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::domain::subscriber_email::SubscriberEmail;

/// Read access to the subscriber table and read/write access to the singleton
/// "latest newsletter image" record.
///
/// Every method swallows connection faults: an unreachable store yields the
/// same absence value an empty store would (empty list / 0 / None / false),
/// after logging. Callers cannot distinguish the two cases at this layer.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn subscriber_emails(&self) -> Vec<SubscriberEmail>;

    async fn subscriber_count(&self) -> i64;

    /// Upsert on the fixed singleton row. Idempotent: repeating the same URL
    /// simply refreshes the timestamp.
    async fn store_latest_image_url(&self, url: &str) -> bool;

    async fn latest_image_url(&self) -> Option<String>;
}

pub struct PgSubscriberStore {
    db_pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(db_pool: PgPool) -> PgSubscriberStore {
        PgSubscriberStore { db_pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(name = "Fetching all subscriber emails", skip(self))]
    async fn subscriber_emails(&self) -> Vec<SubscriberEmail> {
        let rows = sqlx::query(
            r#"
            SELECT email
            FROM newsletter_subs
            ORDER BY email
            "#,
        )
        .map(|row: PgRow| row.get::<String, _>("email"))
        .fetch_all(&self.db_pool)
        .await;

        match rows {
            Ok(emails) => emails
                .into_iter()
                .filter_map(|email| match SubscriberEmail::parse(email) {
                    Ok(email) => Some(email),
                    Err(err) => {
                        tracing::warn!("Skipping a stored subscriber: {}", err);
                        None
                    }
                })
                .collect(),
            Err(err) => {
                tracing::error!("Failed to fetch subscribers: {:?}", err);
                Vec::new()
            }
        }
    }

    #[tracing::instrument(name = "Counting subscribers", skip(self))]
    async fn subscriber_count(&self) -> i64 {
        let count = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM newsletter_subs
            "#,
        )
        .map(|row: PgRow| row.get::<i64, _>("count"))
        .fetch_one(&self.db_pool)
        .await;

        match count {
            Ok(count) => count,
            Err(err) => {
                tracing::error!("Failed to count subscribers: {:?}", err);
                0
            }
        }
    }

    #[tracing::instrument(name = "Storing the latest image URL", skip(self))]
    async fn store_latest_image_url(&self, url: &str) -> bool {
        let result = sqlx::query(
            r#"
            INSERT INTO latest_newsletter_image (id, image_url, uploaded_at)
            VALUES (1, $1, CURRENT_TIMESTAMP)
            ON CONFLICT (id)
            DO UPDATE SET image_url = $1, uploaded_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(url)
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!("Latest image URL stored: {}", url);
                true
            }
            Err(err) => {
                tracing::error!("Failed to store the latest image URL: {:?}", err);
                false
            }
        }
    }

    #[tracing::instrument(name = "Fetching the latest image URL", skip(self))]
    async fn latest_image_url(&self) -> Option<String> {
        let url = sqlx::query(
            r#"
            SELECT image_url
            FROM latest_newsletter_image
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .map(|row: PgRow| row.get::<String, _>("image_url"))
        .fetch_optional(&self.db_pool)
        .await;

        match url {
            Ok(url) => url,
            Err(err) => {
                tracing::error!("Failed to fetch the latest image URL: {:?}", err);
                None
            }
        }
    }
}
