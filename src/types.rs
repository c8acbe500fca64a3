use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{
    db::{Database, DatabaseHealth},
    errors::AppError,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db_health: Option<DatabaseHealth>,
    pub uptime_seconds: u64,
}

// Shared application state
pub struct AppState {
    pub start_time: Instant,
    pub db: Database,
    pub version: String,
}
