mod health_check;
mod home;
mod preview;
mod schedule;
mod test_email;
mod upload;

pub use health_check::health_check;
pub use home::home;
pub use preview::preview;
pub use schedule::{schedule_newsletter, send_now};
pub use test_email::test_email;
pub use upload::upload_image;
