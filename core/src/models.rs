use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Ett målepunkt i en intradag-serie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: i64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: i64) -> Self {
        Self { timestamp, value }
    }
}

/// Kronologisk ordnet serie for én dag.
pub type Series = Vec<Sample>;

/// Ett loggført treningspass.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogEntry {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub steps: u64,
    pub distance_km: f64,
    pub duration: Duration,
    pub calories: u64,
}

/// Rad i `activity_log_data_all`: én tidsstempel, fire (mulig manglende) verdier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityLogSample {
    pub timestamp: NaiveDateTime,
    pub calories: Option<i64>,
    pub steps: Option<i64>,
    pub floors: Option<i64>,
    pub pace: Option<i64>,
}
