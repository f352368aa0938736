//! Operator write path: set the available-seat count of one program.
//!
//! Input is parsed into a `SeatCount` before anything touches the backend,
//! so a rejected value never reaches `Store::update_seat`.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::models::SeatAvailability;
use crate::repository::Repository;

/// Why an operator-entered seat count was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeatInputError {
    #[error("Please enter a valid non-negative number for available seats.")]
    NotANumber(String),

    #[error("Available seats cannot be negative (got {0}).")]
    Negative(i64),

    #[error("Available seats must be a whole number (got {0}).")]
    Fractional(f64),

    #[error("Available seats must be at most {}.", i32::MAX)]
    TooLarge,
}

/// A validated, non-negative seat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatCount(i32);

impl SeatCount {
    pub fn get(self) -> i32 {
        self.0
    }

    /// Parse a form value such as `"12"` or `" 7 "`.
    pub fn parse(input: &str) -> Result<Self, SeatInputError> {
        let trimmed = input.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::try_from(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Self::from_float(f),
            _ => Err(SeatInputError::NotANumber(input.to_string())),
        }
    }

    /// Accept a JSON number or a numeric string.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SeatInputError> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::try_from(i)
                } else if n.is_u64() {
                    Err(SeatInputError::TooLarge)
                } else {
                    Self::from_float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::parse(s),
            other => Err(SeatInputError::NotANumber(other.to_string())),
        }
    }

    fn from_float(f: f64) -> Result<Self, SeatInputError> {
        if !f.is_finite() {
            return Err(SeatInputError::NotANumber(f.to_string()));
        }
        if f < 0.0 {
            return Err(SeatInputError::Negative(f.floor() as i64));
        }
        if f.fract() != 0.0 {
            return Err(SeatInputError::Fractional(f));
        }
        Self::try_from(f as i64)
    }
}

impl TryFrom<i64> for SeatCount {
    type Error = SeatInputError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if n < 0 {
            return Err(SeatInputError::Negative(n));
        }
        i32::try_from(n)
            .map(SeatCount)
            .map_err(|_| SeatInputError::TooLarge)
    }
}

/// Result of a seat write.
#[derive(Debug, Clone, PartialEq)]
pub enum SeatUpdateOutcome {
    Updated(SeatAvailability),
    /// No row has this program id.
    NotFound,
    /// The backend rejected or dropped the write.
    Failed(String),
}

impl SeatUpdateOutcome {
    pub fn user_message(&self) -> &'static str {
        match self {
            SeatUpdateOutcome::Updated(_) => "Seat availability has been updated.",
            SeatUpdateOutcome::NotFound => "That program no longer exists.",
            SeatUpdateOutcome::Failed(_) => {
                "Could not update seat availability. Please try again."
            }
        }
    }
}

/// Write `count` to the program's row and stamp `last_updated`.
pub async fn update_seat(repo: &Repository, program_id: &str, count: SeatCount) -> SeatUpdateOutcome {
    match repo.write_seat(program_id, count.get(), Utc::now()).await {
        Ok(Some(seat)) => {
            tracing::info!(
                program_id = %program_id,
                available = seat.available,
                quota = seat.quota,
                "Seat availability updated"
            );
            if seat.available > seat.quota {
                tracing::warn!(
                    program_id = %program_id,
                    available = seat.available,
                    quota = seat.quota,
                    "Available seats exceed quota"
                );
            }
            SeatUpdateOutcome::Updated(seat)
        }
        Ok(None) => {
            tracing::warn!(program_id = %program_id, "Seat update matched no row");
            SeatUpdateOutcome::NotFound
        }
        Err(e) => {
            tracing::error!(program_id = %program_id, error = %e, "Error updating seat");
            SeatUpdateOutcome::Failed(e.to_string())
        }
    }
}
