use crate::config::DatabaseConfig;
use crate::domain::types::{OwnerName, ParkedCar, PlateNumber, Receipt, SlotNumber};
use crate::error::{LedgerError, Result};
use crate::storage::{EntryOutcome, ParkingStore};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

const ACTIVE_PLATE_INDEX: &str = "parked_cars_active_plate_idx";
const ACTIVE_SLOT_INDEX: &str = "parked_cars_active_slot_idx";

/// Postgres-backed store.
///
/// Uniqueness of active plates and slots is enforced by partial unique
/// indexes, so concurrent writers from other processes cannot double-assign.
pub struct PgParkingStore {
    pool: PgPool,
}

impl PgParkingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            "Connecting to parking database (max_connections={})",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| LedgerError::backend("connect", e))?;

        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running parking database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::backend("run_migrations", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn car_from_row(r: &PgRow) -> Result<ParkedCar> {
        let plate: String = r
            .try_get("plate_number")
            .map_err(|e| LedgerError::backend("decode_row", e))?;
        let owner: String = r
            .try_get("owner_name")
            .map_err(|e| LedgerError::backend("decode_row", e))?;
        let slot: i32 = r
            .try_get("slot_number")
            .map_err(|e| LedgerError::backend("decode_row", e))?;
        let slot = u32::try_from(slot)
            .map_err(|_| LedgerError::backend("decode_row", format!("negative slot {slot}")))?;

        Ok(ParkedCar {
            plate_number: PlateNumber::normalize(&plate),
            owner_name: OwnerName::parse(&owner)?,
            slot_number: SlotNumber::new(slot),
            entry_time: r
                .try_get("entry_time")
                .map_err(|e| LedgerError::backend("decode_row", e))?,
        })
    }

    fn entry_conflict(err: &sqlx::Error) -> Option<EntryOutcome> {
        let db_err = err.as_database_error()?;
        if !db_err.is_unique_violation() {
            return None;
        }
        match db_err.constraint() {
            Some(ACTIVE_PLATE_INDEX) => Some(EntryOutcome::PlateTaken),
            Some(ACTIVE_SLOT_INDEX) => Some(EntryOutcome::SlotTaken),
            _ => None,
        }
    }
}

#[async_trait]
impl ParkingStore for PgParkingStore {
    async fn persist_entry(&self, car: &ParkedCar) -> Result<EntryOutcome> {
        let slot = slot_param(car.slot_number).ok_or_else(|| LedgerError::InvalidInput {
            field: "slot_number",
            reason: format!("{} does not fit the slot_number column", car.slot_number),
        })?;
        let result = sqlx::query(
            r#"
            INSERT INTO parking.parked_cars (plate_number, owner_name, slot_number, entry_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(car.plate_number.as_str())
        .bind(car.owner_name.as_str())
        .bind(slot)
        .bind(car.entry_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(EntryOutcome::Persisted),
            Err(e) => match Self::entry_conflict(&e) {
                Some(outcome) => {
                    debug!("Entry for {} rejected by constraint: {:?}", car.plate_number, outcome);
                    Ok(outcome)
                }
                None => Err(LedgerError::backend("persist_entry", e)),
            },
        }
    }

    async fn persist_exit(&self, plate: &PlateNumber, receipt: &Receipt) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parking.parked_cars
            SET is_active = FALSE, exit_time = $2, total_amount = $3, receipt = $4,
                updated_at = NOW()
            WHERE plate_number = $1 AND is_active
            "#,
        )
        .bind(plate.as_str())
        .bind(receipt.exit_time)
        .bind(i64::try_from(receipt.total_amount.units()).unwrap_or(i64::MAX))
        .bind(Json(receipt))
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::backend("persist_exit", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_active(&self) -> Result<Vec<ParkedCar>> {
        let rows = sqlx::query(
            r#"
            SELECT plate_number, owner_name, slot_number, entry_time
            FROM parking.parked_cars
            WHERE is_active
            ORDER BY entry_time ASC, slot_number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::backend("query_active", e))?;

        rows.iter().map(Self::car_from_row).collect()
    }

    async fn query_by_slot(&self, slot: SlotNumber) -> Result<Option<ParkedCar>> {
        let Some(slot) = slot_param(slot) else {
            return Ok(None);
        };
        let row = sqlx::query(
            r#"
            SELECT plate_number, owner_name, slot_number, entry_time
            FROM parking.parked_cars
            WHERE slot_number = $1 AND is_active
            "#,
        )
        .bind(slot)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::backend("query_by_slot", e))?;

        row.as_ref().map(Self::car_from_row).transpose()
    }

    async fn query_by_plate(&self, plate: &PlateNumber) -> Result<Option<ParkedCar>> {
        let row = sqlx::query(
            r#"
            SELECT plate_number, owner_name, slot_number, entry_time
            FROM parking.parked_cars
            WHERE plate_number = $1 AND is_active
            "#,
        )
        .bind(plate.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::backend("query_by_plate", e))?;

        row.as_ref().map(Self::car_from_row).transpose()
    }

    async fn recent_receipts(&self, limit: usize) -> Result<Vec<Receipt>> {
        let rows = sqlx::query(
            r#"
            SELECT receipt
            FROM parking.parked_cars
            WHERE NOT is_active AND receipt IS NOT NULL
            ORDER BY exit_time DESC, updated_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::backend("recent_receipts", e))?;

        rows.iter()
            .map(|r| {
                r.try_get::<Json<Receipt>, _>("receipt")
                    .map(|json| json.0)
                    .map_err(|e| LedgerError::backend("decode_receipt", e))
            })
            .collect()
    }
}

fn slot_param(slot: SlotNumber) -> Option<i32> {
    i32::try_from(slot.get()).ok()
}
