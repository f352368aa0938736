//! Record shapes shared by the data access layer and the views.

pub mod message;
pub mod seat;
pub mod session;
pub mod summary;
pub mod user;

pub use message::{Sender, SessionMessage};
pub use seat::SeatAvailability;
pub use session::{compute_duration, Session, SessionDuration, SessionRecord, SessionStatus};
pub use summary::SessionSummary;
pub use user::User;

use thiserror::Error;

/// A text column held a value outside its closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown session status: {0}")]
    UnknownStatus(String),

    #[error("unknown message sender: {0}")]
    UnknownSender(String),
}
