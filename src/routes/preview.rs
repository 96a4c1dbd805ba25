use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::renderer::render_newsletter;
use crate::store::SubscriberStore;

#[derive(Deserialize, Debug)]
pub struct PreviewQuery {
    image_url: Option<String>,
}

/// Renders the newsletter exactly as subscribers will receive it, for the
/// given image URL or the stored latest one.
#[tracing::instrument(name = "Preview handler", skip(store))]
pub async fn preview(
    query: web::Query<PreviewQuery>,
    store: web::Data<dyn SubscriberStore>,
) -> HttpResponse {
    let image_url = match query.into_inner().image_url {
        Some(url) => Some(url),
        None => store.latest_image_url().await,
    };

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_newsletter(image_url.as_deref()))
}
