mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{harness, harness_with, HarnessOptions};
use DealerInfra::error::{Error, ErrorKind};
use DealerInfra::types::ledger::{LedgerStatus, PaymentMethod, TransactionType};
use DealerInfra::types::money::Money;
use DealerInfra::types::negotiation::NegotiationStatus;

#[test]
fn held_row_turns_into_busy_not_a_hang() {
    let h = Arc::new(harness_with(HarnessOptions {
        lock_wait_ms: 50,
        ..HarnessOptions::default()
    }));
    let vehicle = h.seed_vehicle("RACE-1", Money::from_units(10_000));
    let negotiation_id = h.draft(vec![h.out_item(vehicle, 10_000)]);

    let guard = h.store.lock_vehicle(&vehicle).unwrap();

    let worker = Arc::clone(&h);
    let outcome = thread::spawn(move || {
        worker
            .engines
            .approval
            .approve(negotiation_id, worker.actor)
    })
    .join()
    .unwrap();

    let err = outcome.unwrap_err();
    assert!(matches!(err, Error::Busy { .. }));
    assert_eq!(err.kind(), ErrorKind::Busy);
    assert!(err.is_retryable());
    drop(guard);

    // Nothing happened while the row was held.
    assert_eq!(
        h.store.get_negotiation(&negotiation_id).unwrap().status,
        NegotiationStatus::Draft
    );
    // Released row, same call succeeds.
    assert!(h.engines.approval.approve(negotiation_id, h.actor).is_ok());
}

#[test]
fn parallel_settlements_serialize_on_one_account() {
    let h = Arc::new(harness_with(HarnessOptions {
        lock_wait_ms: 2_000,
        ..HarnessOptions::default()
    }));
    let ledgers: Vec<_> = (0..6)
        .map(|_| h.seed_ledger(TransactionType::Receivable, 1_000))
        .collect();

    let handles: Vec<_> = ledgers
        .iter()
        .map(|ledger_id| {
            let worker = Arc::clone(&h);
            let ledger_id = *ledger_id;
            thread::spawn(move || {
                worker.engines.settlement.settle(
                    ledger_id,
                    Money::from_units(1_000),
                    worker.account,
                    PaymentMethod::Transfer,
                    worker.actor,
                )
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    assert_eq!(
        h.store.get_account(&h.account).unwrap().balance,
        Money::from_units(26_000)
    );
    for ledger_id in &ledgers {
        assert_eq!(
            h.store.get_ledger(ledger_id).unwrap().status,
            LedgerStatus::Paid
        );
    }
}

#[test]
fn competing_sales_of_one_vehicle_pick_exactly_one_winner() {
    let h = Arc::new(harness_with(HarnessOptions {
        lock_wait_ms: 2_000,
        ..HarnessOptions::default()
    }));
    let vehicle = h.seed_vehicle("RACE-2", Money::from_units(10_000));
    let first = h.draft(vec![h.out_item(vehicle, 10_000)]);
    let second = h.draft(vec![h.out_item(vehicle, 9_500)]);

    let results: Vec<_> = [first, second]
        .into_iter()
        .map(|negotiation_id| {
            let worker = Arc::clone(&h);
            thread::spawn(move || worker.engines.approval.approve(negotiation_id, worker.actor))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, Error::VehicleNotAvailable { .. }));
        }
    }
}

#[test]
fn settlement_and_cancellation_race_to_a_consistent_state() {
    let h = Arc::new(harness_with(HarnessOptions {
        lock_wait_ms: 2_000,
        ..HarnessOptions::default()
    }));
    let vehicle = h.seed_vehicle("RACE-3", Money::from_units(5_000));
    let negotiation_id = h.draft(vec![h.out_item(vehicle, 5_000)]);
    h.engines.approval.approve(negotiation_id, h.actor).unwrap();
    let ledger_id = h.negotiation_ledger(negotiation_id).unwrap().ledger_id;

    let settler = Arc::clone(&h);
    let settle_handle = thread::spawn(move || {
        settler.engines.settlement.settle(
            ledger_id,
            Money::from_units(5_000),
            settler.account,
            PaymentMethod::Transfer,
            settler.actor,
        )
    });
    let canceler = Arc::clone(&h);
    let cancel_handle =
        thread::spawn(move || canceler.engines.cancellation.cancel(negotiation_id, canceler.actor));

    let settle_result = settle_handle.join().unwrap();
    let cancel_result = cancel_handle.join().unwrap();

    let ledger = h.store.get_ledger(&ledger_id).unwrap();
    let negotiation = h.store.get_negotiation(&negotiation_id).unwrap();
    let balance = h.store.get_account(&h.account).unwrap().balance;
    match (&settle_result, &cancel_result) {
        (Ok(_), Err(Error::NegotiationAlreadySettled { .. })) => {
            assert_eq!(ledger.status, LedgerStatus::Paid);
            assert_eq!(negotiation.status, NegotiationStatus::Approved);
            assert_eq!(balance, Money::from_units(25_000));
        }
        (Err(Error::LedgerClosed { .. }), Ok(_)) => {
            assert_eq!(ledger.status, LedgerStatus::Canceled);
            assert_eq!(negotiation.status, NegotiationStatus::Canceled);
            assert_eq!(balance, Money::from_units(20_000));
        }
        other => panic!("inconsistent race outcome: {other:?}"),
    }
}

#[test]
fn short_waits_expire_quickly() {
    let h = harness_with(HarnessOptions {
        lock_wait_ms: 20,
        ..HarnessOptions::default()
    });
    let ledger_id = h.seed_ledger(TransactionType::Receivable, 100);
    let guard = h.store.lock_ledger(&ledger_id).unwrap();

    let started = std::time::Instant::now();
    let err = h
        .engines
        .settlement
        .settle(
            ledger_id,
            Money::from_units(100),
            h.account,
            PaymentMethod::Cash,
            h.actor,
        )
        .unwrap_err();
    let waited = started.elapsed();

    assert_eq!(err.kind(), ErrorKind::Busy);
    assert!(waited >= Duration::from_millis(20));
    assert!(waited < Duration::from_secs(2));
    drop(guard);
}
