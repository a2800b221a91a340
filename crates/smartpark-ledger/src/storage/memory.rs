use crate::domain::types::{ParkedCar, PlateNumber, Receipt, SlotNumber};
use crate::error::Result;
use crate::storage::{EntryOutcome, ParkingStore};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Receipts retained in memory; the oldest recorded are dropped first
pub const DEFAULT_RECEIPT_LOG_CAPACITY: usize = 1_000;

#[derive(Default)]
struct MemoryState {
    active: HashMap<PlateNumber, ParkedCar>,
    receipts: VecDeque<Receipt>,
}

/// Process-local store; state is lost on restart.
pub struct InMemoryParkingStore {
    state: RwLock<MemoryState>,
    receipt_capacity: usize,
}

impl Default for InMemoryParkingStore {
    fn default() -> Self {
        Self::with_receipt_capacity(DEFAULT_RECEIPT_LOG_CAPACITY)
    }
}

impl InMemoryParkingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receipt_capacity(receipt_capacity: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            receipt_capacity: receipt_capacity.max(1),
        }
    }
}

#[async_trait]
impl ParkingStore for InMemoryParkingStore {
    async fn persist_entry(&self, car: &ParkedCar) -> Result<EntryOutcome> {
        let mut state = self.state.write().await;

        if state.active.contains_key(&car.plate_number) {
            return Ok(EntryOutcome::PlateTaken);
        }
        if state
            .active
            .values()
            .any(|parked| parked.slot_number == car.slot_number)
        {
            return Ok(EntryOutcome::SlotTaken);
        }

        state.active.insert(car.plate_number.clone(), car.clone());
        Ok(EntryOutcome::Persisted)
    }

    async fn persist_exit(&self, plate: &PlateNumber, receipt: &Receipt) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.active.remove(plate).is_none() {
            return Ok(false);
        }
        if state.receipts.len() >= self.receipt_capacity {
            state.receipts.pop_front();
        }
        state.receipts.push_back(receipt.clone());
        Ok(true)
    }

    async fn query_active(&self) -> Result<Vec<ParkedCar>> {
        let state = self.state.read().await;
        Ok(state.active.values().cloned().collect())
    }

    async fn query_by_slot(&self, slot: SlotNumber) -> Result<Option<ParkedCar>> {
        let state = self.state.read().await;
        Ok(state
            .active
            .values()
            .find(|car| car.slot_number == slot)
            .cloned())
    }

    async fn query_by_plate(&self, plate: &PlateNumber) -> Result<Option<ParkedCar>> {
        let state = self.state.read().await;
        Ok(state.active.get(plate).cloned())
    }

    async fn recent_receipts(&self, limit: usize) -> Result<Vec<Receipt>> {
        let state = self.state.read().await;
        // Latest exit first, ties broken by most recently recorded
        let mut receipts: Vec<&Receipt> = state.receipts.iter().rev().collect();
        receipts.sort_by(|a, b| b.exit_time.cmp(&a.exit_time));
        Ok(receipts.into_iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fees::FeeCalculator;
    use crate::domain::types::OwnerName;
    use chrono::{Duration, Utc};

    fn car(plate: &str, slot: u32) -> ParkedCar {
        ParkedCar {
            plate_number: PlateNumber::parse(plate).unwrap(),
            owner_name: OwnerName::parse("Alice").unwrap(),
            slot_number: SlotNumber::new(slot),
            entry_time: Utc::now(),
        }
    }

    fn receipt_for(car: &ParkedCar) -> Receipt {
        let exit_time = car.entry_time + Duration::minutes(45);
        let fee = FeeCalculator::default().compute_fee(car.entry_time, exit_time);
        Receipt::new(car.clone(), exit_time, fee)
    }

    #[tokio::test]
    async fn test_conflicting_entries_are_rejected() {
        let store = InMemoryParkingStore::new();

        assert_eq!(
            store.persist_entry(&car("RAC 001A", 1)).await.unwrap(),
            EntryOutcome::Persisted
        );
        assert_eq!(
            store.persist_entry(&car("RAC 001A", 2)).await.unwrap(),
            EntryOutcome::PlateTaken
        );
        assert_eq!(
            store.persist_entry(&car("RAC 002A", 1)).await.unwrap(),
            EntryOutcome::SlotTaken
        );
        assert_eq!(store.query_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exit_moves_car_to_receipt_log() {
        let store = InMemoryParkingStore::new();
        let parked = car("RAC 003B", 4);
        store.persist_entry(&parked).await.unwrap();

        let receipt = receipt_for(&parked);
        assert!(store
            .persist_exit(&parked.plate_number, &receipt)
            .await
            .unwrap());
        assert!(!store
            .persist_exit(&parked.plate_number, &receipt)
            .await
            .unwrap());

        assert!(store
            .query_by_slot(SlotNumber::new(4))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.recent_receipts(10).await.unwrap(), vec![receipt]);
    }

    #[tokio::test]
    async fn test_receipts_ordered_by_exit_time() {
        let store = InMemoryParkingStore::new();
        let late = car("RAB 200A", 1);
        let early = car("RAB 200B", 2);
        store.persist_entry(&late).await.unwrap();
        store.persist_entry(&early).await.unwrap();

        let fees = FeeCalculator::default();
        let late_exit = late.entry_time + Duration::hours(3);
        let early_exit = early.entry_time + Duration::minutes(10);
        let late_receipt = Receipt::new(
            late.clone(),
            late_exit,
            fees.compute_fee(late.entry_time, late_exit),
        );
        let early_receipt = Receipt::new(
            early.clone(),
            early_exit,
            fees.compute_fee(early.entry_time, early_exit),
        );

        store
            .persist_exit(&late.plate_number, &late_receipt)
            .await
            .unwrap();
        store
            .persist_exit(&early.plate_number, &early_receipt)
            .await
            .unwrap();

        let receipts = store.recent_receipts(10).await.unwrap();
        assert_eq!(receipts, vec![late_receipt, early_receipt]);
    }

    #[tokio::test]
    async fn test_receipt_log_is_capped() {
        let store = InMemoryParkingStore::with_receipt_capacity(2);
        for (i, plate) in ["RAE 001", "RAE 002", "RAE 003"].iter().enumerate() {
            let parked = car(plate, i as u32 + 1);
            store.persist_entry(&parked).await.unwrap();
            store
                .persist_exit(&parked.plate_number, &receipt_for(&parked))
                .await
                .unwrap();
        }

        let receipts = store.recent_receipts(10).await.unwrap();
        let plates: Vec<&str> = receipts.iter().map(|r| r.plate_number.as_str()).collect();
        assert_eq!(plates, vec!["RAE 003", "RAE 002"]);
    }

    #[tokio::test]
    async fn test_recent_receipts_newest_first() {
        let store = InMemoryParkingStore::new();
        for (i, plate) in ["RAA 100A", "RAA 100B", "RAA 100C"].iter().enumerate() {
            let parked = car(plate, i as u32 + 1);
            store.persist_entry(&parked).await.unwrap();
            store
                .persist_exit(&parked.plate_number, &receipt_for(&parked))
                .await
                .unwrap();
        }

        let receipts = store.recent_receipts(2).await.unwrap();
        let plates: Vec<&str> = receipts.iter().map(|r| r.plate_number.as_str()).collect();
        assert_eq!(plates, vec!["RAA 100C", "RAA 100B"]);
    }
}
