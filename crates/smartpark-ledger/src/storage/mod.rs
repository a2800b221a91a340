pub mod memory;
pub mod postgres;

pub use memory::InMemoryParkingStore;
pub use postgres::PgParkingStore;

use crate::domain::types::{ParkedCar, PlateNumber, Receipt, SlotNumber};
use crate::error::Result;
use async_trait::async_trait;

/// What the backend did with an entry write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Persisted,
    /// Another active record already holds this plate
    PlateTaken,
    /// Another active record already holds this slot
    SlotTaken,
}

/// Storage capability the ledger writes through.
///
/// The set of active cars held here is the only record of occupancy.
/// Implementations must reject a second active record for the same plate or
/// slot instead of overwriting it.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    async fn persist_entry(&self, car: &ParkedCar) -> Result<EntryOutcome>;

    /// Close the active record for `plate` and append `receipt` to the log.
    /// Returns `false` when no active record matched.
    async fn persist_exit(&self, plate: &PlateNumber, receipt: &Receipt) -> Result<bool>;

    async fn query_active(&self) -> Result<Vec<ParkedCar>>;

    async fn query_by_slot(&self, slot: SlotNumber) -> Result<Option<ParkedCar>>;

    async fn query_by_plate(&self, plate: &PlateNumber) -> Result<Option<ParkedCar>> {
        Ok(self
            .query_active()
            .await?
            .into_iter()
            .find(|car| car.plate_number == *plate))
    }

    /// Latest exit first, ties broken by the most recently recorded
    async fn recent_receipts(&self, limit: usize) -> Result<Vec<Receipt>>;
}
