use proptest::prelude::*;
use smartpark_ledger::config::LotConfig;
use smartpark_ledger::{LedgerError, ParkingLedger, ParkingOperations};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum Op {
    Enter(u8),
    Exit(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12).prop_map(Op::Enter),
        (0u8..12).prop_map(Op::Exit),
    ]
}

fn plate(id: u8) -> String {
    format!("PROP {id:02}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn occupancy_matches_a_simple_model(
        capacity in 1u32..8,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let ledger = ParkingLedger::in_memory(&LotConfig::with_capacity(capacity));
            let mut model: HashMap<u8, u32> = HashMap::new();

            for op in ops {
                match op {
                    Op::Enter(id) => {
                        let result = ledger.enter(&plate(id), "Model").await;
                        if model.contains_key(&id) {
                            prop_assert!(
                                matches!(result, Err(LedgerError::DuplicatePlate { .. })),
                                "expected duplicate plate error"
                            );
                        } else if model.len() as u32 == capacity {
                            prop_assert!(
                                matches!(result, Err(LedgerError::LotFull { .. })),
                                "expected full lot error"
                            );
                        } else {
                            let taken: HashSet<u32> = model.values().copied().collect();
                            let expected = (1..=capacity).find(|s| !taken.contains(s)).unwrap();
                            let ticket = result.unwrap();
                            prop_assert_eq!(ticket.slot_number.get(), expected);
                            model.insert(id, expected);
                        }
                    }
                    Op::Exit(id) => {
                        let result = ledger.exit(&plate(id)).await;
                        match model.remove(&id) {
                            Some(slot) => prop_assert_eq!(result.unwrap().slot_number.get(), slot),
                            None => prop_assert!(
                                matches!(result, Err(LedgerError::NotFound { .. })),
                                "expected not found error"
                            ),
                        }
                    }
                }

                let available = ledger.available_count().await.unwrap();
                prop_assert_eq!(available, capacity - model.len() as u32);

                let slots: HashSet<u32> = ledger
                    .list_active()
                    .await
                    .unwrap()
                    .iter()
                    .map(|car| car.slot_number.get())
                    .collect();
                prop_assert_eq!(slots.len(), model.len());
                prop_assert!(slots.iter().all(|s| (1..=capacity).contains(s)));
            }
            Ok(())
        })?;
    }

    #[test]
    fn fee_is_monotonic_in_stay_length(a in 0i64..10_000, b in 0i64..10_000) {
        let fees = LotConfig::default().fee_calculator();
        let entry = chrono::Utc::now();
        let (short, long) = if a <= b { (a, b) } else { (b, a) };

        let short_fee = fees.compute_fee(entry, entry + chrono::Duration::minutes(short));
        let long_fee = fees.compute_fee(entry, entry + chrono::Duration::minutes(long));

        prop_assert!(short_fee.total_amount <= long_fee.total_amount);
        prop_assert_eq!(
            long_fee.charges.base_hour.add(long_fee.charges.extra_hours),
            long_fee.total_amount
        );
    }
}
