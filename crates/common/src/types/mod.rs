use chrono::{DateTime, Utc};
use serde::Serialize;

/// Liveness payload returned by `/api/health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Health {
    pub fn ok() -> Self {
        Self { success: true, message: "Server is running", timestamp: Utc::now() }
    }
}
