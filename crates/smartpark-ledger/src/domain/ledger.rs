use crate::config::LotConfig;
use crate::domain::fees::FeeCalculator;
use crate::domain::types::{
    EntryTicket, OccupancyStats, OwnerName, ParkedCar, PlateNumber, Receipt, SlotNumber,
};
use crate::error::{LedgerError, Result};
use crate::storage::{EntryOutcome, InMemoryParkingStore, ParkingStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Attempts at reserving a slot when another writer takes it first
const MAX_ENTRY_ATTEMPTS: usize = 3;
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Operations the presentation layer drives the lot through
#[async_trait]
pub trait ParkingOperations: Send + Sync {
    async fn enter(&self, plate_number: &str, owner_name: &str) -> Result<EntryTicket>;

    async fn exit(&self, plate_number: &str) -> Result<Receipt>;

    async fn available_count(&self) -> Result<u32>;

    async fn is_full(&self) -> Result<bool>;

    /// Ordered by entry time, ties broken by slot number
    async fn list_active(&self) -> Result<Vec<ParkedCar>>;

    async fn find_by_plate(&self, plate_number: &str) -> Result<Option<ParkedCar>>;

    async fn slot_info(&self, slot_number: u32) -> Result<Option<ParkedCar>>;

    async fn stats(&self) -> Result<OccupancyStats>;

    async fn recent_receipts(&self, limit: usize) -> Result<Vec<Receipt>>;
}

/// Slot allocation and fee ledger for a single lot.
///
/// Entry and exit are serialized by `write_lock`, which is held across the
/// whole read-decide-write sequence. Occupancy is read back from the store
/// on every decision, so there is no second copy that can drift.
pub struct ParkingLedger {
    capacity: u32,
    fees: FeeCalculator,
    store: Arc<dyn ParkingStore>,
    operation_timeout: Duration,
    write_lock: Mutex<()>,
}

impl ParkingLedger {
    pub fn new(lot: &LotConfig, store: Arc<dyn ParkingStore>) -> Self {
        Self {
            capacity: lot.capacity,
            fees: lot.fee_calculator(),
            store,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory(lot: &LotConfig) -> Self {
        Self::new(lot, Arc::new(InMemoryParkingStore::new()))
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Park a car at `entry_time`.
    ///
    /// Checks run in a fixed order: duplicate plate, then full lot. The
    /// lowest free slot number is assigned.
    pub async fn enter_at(
        &self,
        plate_number: &str,
        owner_name: &str,
        entry_time: DateTime<Utc>,
    ) -> Result<EntryTicket> {
        let plate_number = PlateNumber::parse(plate_number)?;
        let owner_name = OwnerName::parse(owner_name)?;

        let _guard = self.write_lock.lock().await;

        for attempt in 1..=MAX_ENTRY_ATTEMPTS {
            let active = self
                .call("query_active", self.store.query_active())
                .await?;

            if active.iter().any(|car| car.plate_number == plate_number) {
                return Err(LedgerError::DuplicatePlate {
                    plate: plate_number,
                });
            }

            let slot_number = lowest_free_slot(&active, self.capacity).ok_or(
                LedgerError::LotFull {
                    capacity: self.capacity,
                },
            )?;

            let car = ParkedCar {
                plate_number: plate_number.clone(),
                owner_name: owner_name.clone(),
                slot_number,
                entry_time,
            };

            match self
                .call("persist_entry", self.store.persist_entry(&car))
                .await?
            {
                EntryOutcome::Persisted => {
                    info!("Car {} assigned to slot {}", plate_number, slot_number);
                    return Ok(EntryTicket {
                        slot_number,
                        entry_time,
                    });
                }
                EntryOutcome::PlateTaken => {
                    return Err(LedgerError::DuplicatePlate {
                        plate: plate_number,
                    });
                }
                EntryOutcome::SlotTaken => {
                    warn!(
                        "Slot {} was taken concurrently (attempt {}/{}), retrying",
                        slot_number, attempt, MAX_ENTRY_ATTEMPTS
                    );
                }
            }
        }

        Err(LedgerError::BackendUnavailable {
            operation: "persist_entry",
            reason: format!("slot contention persisted after {MAX_ENTRY_ATTEMPTS} attempts"),
        })
    }

    /// Release the car's slot at `exit_time` and price the stay.
    pub async fn exit_at(&self, plate_number: &str, exit_time: DateTime<Utc>) -> Result<Receipt> {
        let plate_number = PlateNumber::normalize(plate_number);

        let _guard = self.write_lock.lock().await;

        let car = self
            .call("query_by_plate", self.store.query_by_plate(&plate_number))
            .await?
            .ok_or_else(|| LedgerError::NotFound {
                plate: plate_number.clone(),
            })?;

        let fee = self.fees.compute_fee(car.entry_time, exit_time);
        if fee.clock_skew {
            warn!(
                "Exit time {} precedes entry time {} for {}; billing zero elapsed time",
                exit_time, car.entry_time, plate_number
            );
        }
        let receipt = Receipt::new(car, exit_time, fee);

        let closed = self
            .call(
                "persist_exit",
                self.store.persist_exit(&plate_number, &receipt),
            )
            .await?;
        if !closed {
            return Err(LedgerError::NotFound {
                plate: plate_number,
            });
        }

        info!(
            "Car {} left slot {}, charged {}",
            receipt.plate_number, receipt.slot_number, receipt.total_amount
        );
        Ok(receipt)
    }

    async fn occupied_count(&self) -> Result<u32> {
        let active = self
            .call("query_active", self.store.query_active())
            .await?;
        Ok(u32::try_from(active.len()).unwrap_or(u32::MAX))
    }

    /// Bound a storage call by the configured timeout.
    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Storage operation {} timed out after {:?}",
                    operation, self.operation_timeout
                );
                Err(LedgerError::BackendUnavailable {
                    operation,
                    reason: format!("timed out after {:?}", self.operation_timeout),
                })
            }
        }
    }
}

fn lowest_free_slot(active: &[ParkedCar], capacity: u32) -> Option<SlotNumber> {
    let occupied: HashSet<SlotNumber> = active.iter().map(|car| car.slot_number).collect();
    (1..=capacity)
        .map(SlotNumber::new)
        .find(|slot| !occupied.contains(slot))
}

#[async_trait]
impl ParkingOperations for ParkingLedger {
    async fn enter(&self, plate_number: &str, owner_name: &str) -> Result<EntryTicket> {
        self.enter_at(plate_number, owner_name, Utc::now()).await
    }

    async fn exit(&self, plate_number: &str) -> Result<Receipt> {
        self.exit_at(plate_number, Utc::now()).await
    }

    async fn available_count(&self) -> Result<u32> {
        let occupied = self.occupied_count().await?;
        Ok(self.capacity.saturating_sub(occupied))
    }

    async fn is_full(&self) -> Result<bool> {
        Ok(self.available_count().await? == 0)
    }

    async fn list_active(&self) -> Result<Vec<ParkedCar>> {
        let mut cars = self
            .call("query_active", self.store.query_active())
            .await?;
        cars.sort_by(|a, b| {
            a.entry_time
                .cmp(&b.entry_time)
                .then(a.slot_number.cmp(&b.slot_number))
        });
        debug!("Listing {} active cars", cars.len());
        Ok(cars)
    }

    async fn find_by_plate(&self, plate_number: &str) -> Result<Option<ParkedCar>> {
        let plate_number = PlateNumber::normalize(plate_number);
        self.call("query_by_plate", self.store.query_by_plate(&plate_number))
            .await
    }

    async fn slot_info(&self, slot_number: u32) -> Result<Option<ParkedCar>> {
        let slot = SlotNumber::new(slot_number);
        if !slot.within(self.capacity) {
            return Err(LedgerError::InvalidSlot {
                slot,
                capacity: self.capacity,
            });
        }
        self.call("query_by_slot", self.store.query_by_slot(slot))
            .await
    }

    async fn stats(&self) -> Result<OccupancyStats> {
        let occupied = self.occupied_count().await?;
        Ok(OccupancyStats::new(self.capacity, occupied))
    }

    async fn recent_receipts(&self, limit: usize) -> Result<Vec<Receipt>> {
        self.call("recent_receipts", self.store.recent_receipts(limit))
            .await
    }
}
