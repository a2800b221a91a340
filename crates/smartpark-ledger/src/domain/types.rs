use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::fees::FeeBreakdown;
use crate::error::{LedgerError, Result};

/// Vehicle registration plate, trimmed and upper-cased.
///
/// Interior whitespace is kept, so `"  rad 123a "` and `"RAD 123A"` are the
/// same plate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlateNumber(String);

impl PlateNumber {
    /// Normalize and validate a plate supplied at entry.
    pub fn parse(raw: &str) -> Result<Self> {
        let plate = Self::normalize(raw);
        if plate.0.is_empty() {
            return Err(LedgerError::InvalidInput {
                field: "plate_number",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(plate)
    }

    /// Normalize without validation, for lookups where an empty plate simply
    /// matches nothing.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PlateNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PlateNumber> for String {
    fn from(plate: PlateNumber) -> Self {
        plate.0
    }
}

/// Name of the person who parked the car, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerName(String);

impl OwnerName {
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput {
                field: "owner_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OwnerName {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<OwnerName> for String {
    fn from(name: OwnerName) -> Self {
        name.0
    }
}

/// One-based parking slot number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotNumber(u32);

impl SlotNumber {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn within(&self, capacity: u32) -> bool {
        (1..=capacity).contains(&self.0)
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole currency units (RWF in the default tariff)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn new(units: u64) -> Self {
        Self(units)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn units(&self) -> u64 {
        self.0
    }

    /// Saturates at `u64::MAX`
    pub fn add(&self, other: Amount) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturates at `u64::MAX`
    pub fn times(&self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A car currently occupying a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkedCar {
    pub plate_number: PlateNumber,
    pub owner_name: OwnerName,
    pub slot_number: SlotNumber,
    pub entry_time: DateTime<Utc>,
}

/// Result of a successful entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTicket {
    pub slot_number: SlotNumber,
    pub entry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDuration {
    /// Whole hours parked
    pub hours: u64,
    /// Minutes past the last whole hour, rounded up
    pub minutes: u64,
    /// Hours billed, rounded up
    pub total_hours: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charges {
    pub base_hour: Amount,
    pub extra_hours: Amount,
    pub total_amount: Amount,
}

/// Immutable snapshot of a completed stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_id: Uuid,
    pub plate_number: PlateNumber,
    pub owner_name: OwnerName,
    pub slot_number: SlotNumber,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub duration: StayDuration,
    pub charges: Charges,
    pub total_amount: Amount,
    /// Set when the exit instant preceded the entry instant and the stay was
    /// billed as zero elapsed time.
    #[serde(default)]
    pub clock_skew: bool,
}

impl Receipt {
    pub fn new(car: ParkedCar, exit_time: DateTime<Utc>, fee: FeeBreakdown) -> Self {
        Self {
            receipt_id: Uuid::new_v4(),
            plate_number: car.plate_number,
            owner_name: car.owner_name,
            slot_number: car.slot_number,
            entry_time: car.entry_time,
            exit_time,
            duration: fee.duration,
            charges: fee.charges,
            total_amount: fee.total_amount,
            clock_skew: fee.clock_skew,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyStats {
    pub total_slots: u32,
    pub occupied_slots: u32,
    pub available_slots: u32,
    /// Percentage, rounded to two decimals
    pub occupancy_rate: f64,
    pub is_full: bool,
}

impl OccupancyStats {
    pub fn new(total_slots: u32, occupied_slots: u32) -> Self {
        let occupied_slots = occupied_slots.min(total_slots);
        let rate = if total_slots == 0 {
            0.0
        } else {
            f64::from(occupied_slots) / f64::from(total_slots) * 100.0
        };
        Self {
            total_slots,
            occupied_slots,
            available_slots: total_slots - occupied_slots,
            occupancy_rate: (rate * 100.0).round() / 100.0,
            is_full: occupied_slots >= total_slots,
        }
    }
}
