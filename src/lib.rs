pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod utils;

use std::sync::Arc;

pub use config::Config;
pub use engine::BookingEngine;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<BookingEngine>,
}
