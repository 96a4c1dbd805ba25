use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::scheduler::Scheduler;
use crate::utils::see_other;

#[derive(Deserialize, Debug)]
pub struct ScheduleForm {
    send_date: Option<String>,
    send_time: Option<String>,
}

/// Registers a newsletter send at a future, operator-local date and time.
#[tracing::instrument(name = "Schedule handler", skip(scheduler))]
pub async fn schedule_newsletter(
    form: web::Form<ScheduleForm>,
    scheduler: web::Data<Scheduler>,
) -> HttpResponse {
    let form = form.into_inner();

    let (send_date, send_time) = match (form.send_date, form.send_time) {
        (Some(date), Some(time)) if !date.is_empty() && !time.is_empty() => (date, time),
        _ => {
            FlashMessage::error("Please provide date and time").send();
            return see_other("/");
        }
    };

    let naive = match NaiveDateTime::parse_from_str(
        &format!("{} {}", send_date, send_time),
        "%Y-%m-%d %H:%M",
    ) {
        Ok(naive) => naive,
        Err(_) => {
            FlashMessage::error("Invalid date/time format").send();
            return see_other("/");
        }
    };

    // Operators type wall-clock local time; ambiguous or skipped instants
    // around DST transitions are rejected like any other invalid input
    let send_datetime = match Local.from_local_datetime(&naive).single() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            FlashMessage::error("Invalid date/time format").send();
            return see_other("/");
        }
    };

    if send_datetime <= Utc::now() {
        FlashMessage::error("Send time must be in the future").send();
        return see_other("/");
    }

    scheduler.schedule(send_datetime);

    FlashMessage::info(format!(
        "Newsletter scheduled for {}",
        naive.format("%Y-%m-%d at %H:%M")
    ))
    .send();

    see_other("/")
}

/// Registers an immediate newsletter send. The job passes the current time
/// straight through; dispatch begins with no wait.
#[tracing::instrument(name = "Send now handler", skip(scheduler))]
pub async fn send_now(scheduler: web::Data<Scheduler>) -> HttpResponse {
    scheduler.schedule(Utc::now());

    FlashMessage::info("Newsletter is being sent now! Check logs for progress.").send();

    see_other("/")
}
