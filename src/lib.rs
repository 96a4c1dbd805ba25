pub mod config;
pub mod domain;
pub mod image_store;
pub mod mailer;
pub mod renderer;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
