pub mod fees;
pub mod ledger;
pub mod types;

pub use fees::{FeeBreakdown, FeeCalculator};
pub use ledger::{ParkingLedger, ParkingOperations};
pub use types::{
    Amount, Charges, EntryTicket, OccupancyStats, OwnerName, ParkedCar, PlateNumber, Receipt,
    SlotNumber, StayDuration,
};
