//! In-memory copy of the seat list, dropped after every successful seat write.

use agentdesk_core::models::SeatAvailability;
use agentdesk_core::Repository;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct SeatCache {
    enabled: bool,
    seats: RwLock<Option<Vec<SeatAvailability>>>,
}

impl SeatCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seats: RwLock::new(None),
        }
    }

    /// Cached seats, or a fresh read from the backend.
    ///
    /// An empty read is not cached: the repository returns an empty list on
    /// query failure and the next request should try again.
    pub async fn get_or_load(&self, repo: &Repository) -> Vec<SeatAvailability> {
        if !self.enabled {
            return repo.seats().await;
        }

        if let Some(seats) = self.seats.read().await.as_ref() {
            return seats.clone();
        }

        let mut slot = self.seats.write().await;
        if let Some(seats) = slot.as_ref() {
            return seats.clone();
        }
        let seats = repo.seats().await;
        if !seats.is_empty() {
            *slot = Some(seats.clone());
        }
        seats
    }

    pub async fn invalidate(&self) {
        let mut slot = self.seats.write().await;
        if slot.take().is_some() {
            tracing::debug!("Seat list cache invalidated");
        }
    }

    pub async fn is_warm(&self) -> bool {
        self.seats.read().await.is_some()
    }
}
