pub mod auth;
pub mod calendar;
pub mod chat;
pub mod config;
pub mod database;
pub mod error;
pub mod report;

pub use chat::handler::Engine;
pub use config::Config;
pub use error::{Error, Result};
