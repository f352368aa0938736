use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remaining capacity for one program at one campus.
///
/// `available <= quota` is expected but not enforced anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SeatAvailability {
    pub program_id: String,
    pub program: String,
    pub campus: String,
    pub quota: i32,
    #[sqlx(rename = "available_seats")]
    pub available: i32,
    pub last_updated: DateTime<Utc>,
}
