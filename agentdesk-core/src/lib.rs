pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod models;
pub mod nav;
pub mod repository;
pub mod store;

pub use actions::{update_seat, SeatCount, SeatInputError, SeatUpdateOutcome};
pub use config::{AgentDeskConfig, BackendCredentials, BackendKind};
pub use error::AgentDeskError;
pub use listing::{Page, ViewState};
pub use repository::{MessagePage, Repository};
pub use store::{create_store, FixtureStore, PgStore, Store};
