use actix_web::http::header::LOCATION;
use actix_web::HttpResponse;

/// 303 redirect used after every form submission.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}
