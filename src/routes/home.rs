use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

use crate::scheduler::JobRegistry;
use crate::store::SubscriberStore;

/// Operator dashboard: subscriber count, pending jobs and the upload,
/// schedule, send-now and test-email forms.
#[tracing::instrument(name = "Dashboard handler", skip_all)]
pub async fn home(
    flash_messages: IncomingFlashMessages,
    store: web::Data<dyn SubscriberStore>,
    registry: web::Data<JobRegistry>,
) -> HttpResponse {
    let subscriber_count = store.subscriber_count().await;

    let mut msgs = String::new();
    for m in flash_messages.iter() {
        writeln!(msgs, "<p><i>{}</i></p>", m.content()).unwrap();
    }

    let mut jobs = String::new();
    for job in registry.pending() {
        writeln!(
            jobs,
            "<li>Send at {} (scheduled at {})</li>",
            job.send_time.format("%Y-%m-%d %H:%M:%S UTC"),
            job.scheduled_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .unwrap();
    }
    if jobs.is_empty() {
        jobs.push_str("<li>No newsletters scheduled</li>");
    }

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>ColorStack Newsletter Sender</title>
</head>
<body>
    <h1>ColorStack Newsletter Sender</h1>
    {msgs}
    <p>Subscribers: {subscriber_count}</p>
    <h2>Scheduled newsletters</h2>
    <ol>
        {jobs}
    </ol>
    <h2>Upload newsletter image</h2>
    <form action="/upload" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept=".png,.jpg,.jpeg,.gif">
        <button type="submit">Upload</button>
    </form>
    <h2>Schedule</h2>
    <form action="/schedule" method="post">
        <label>Date: <input type="date" name="send_date"></label>
        <label>Time: <input type="time" name="send_time"></label>
        <button type="submit">Schedule newsletter</button>
    </form>
    <form action="/send_now" method="post">
        <button type="submit">Send now</button>
    </form>
    <h2>Test email</h2>
    <form action="/test_email" method="post">
        <label>Address: <input type="email" name="test_email"></label>
        <button type="submit">Send test email</button>
    </form>
    <p><a href="/preview">Preview the current newsletter</a></p>
</body>
</html>"#
        ))
}
