mod common;

use common::harness;
use DealerInfra::error::{Error, ErrorKind};
use DealerInfra::types::ledger::{LedgerStatus, PaymentMethod};
use DealerInfra::types::money::Money;
use DealerInfra::types::negotiation::{ItemFlow, NegotiationStatus};
use DealerInfra::types::vehicle::VehicleStatus;

#[test]
fn cancellation_reverts_an_approved_deal() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C1", Money::from_units(15_000));
    let trade_in = h.seed_customer_vehicle("IN-C1");
    let negotiation_id = h.draft(vec![h.out_item(sold, 15_000), h.in_item(trade_in, 10_000)]);
    h.engines.approval.approve(negotiation_id, h.actor).unwrap();

    let negotiation = h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap();

    assert_eq!(negotiation.status, NegotiationStatus::Canceled);
    // The receivable is void, not deleted.
    let entry = h.negotiation_ledger(negotiation_id).unwrap();
    assert_eq!(entry.status, LedgerStatus::Canceled);
    // The sold vehicle is back on the lot under the store's name.
    let restored = h.store.get_vehicle(&sold).unwrap();
    assert_eq!(restored.status, VehicleStatus::Available);
    assert_eq!(restored.current_owner, h.store_entity_id());
    // The trade-in is gone, and so is its item.
    assert!(matches!(
        h.store.get_vehicle(&trade_in),
        Err(Error::VehicleNotFound(_))
    ));
    assert!(negotiation.items.iter().all(|item| item.flow == ItemFlow::Out));
}

#[test]
fn draft_cancellation_needs_no_ledger_work() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C2", Money::from_units(9_000));
    let trade_in = h.seed_customer_vehicle("IN-C2");
    let negotiation_id = h.draft(vec![h.out_item(sold, 9_000), h.in_item(trade_in, 4_000)]);

    let negotiation = h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap();

    assert_eq!(negotiation.status, NegotiationStatus::Canceled);
    assert!(h.store.ledgers_for(&negotiation_id).is_empty());
    assert_eq!(
        h.store.get_vehicle(&sold).unwrap().status,
        VehicleStatus::Available
    );
    // Even from a draft, the trade-in row is discarded.
    assert!(h.store.get_vehicle(&trade_in).is_err());
}

#[test]
fn cancelling_twice_is_an_error() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C3", Money::from_units(7_000));
    let negotiation_id = h.draft(vec![h.out_item(sold, 7_000)]);
    h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap();

    let err = h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap_err();
    assert!(matches!(err, Error::NegotiationAlreadyCanceled(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn settled_money_blocks_the_whole_reversal() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C4", Money::from_units(15_000));
    let trade_in = h.seed_customer_vehicle("IN-C4");
    let negotiation_id = h.draft(vec![h.out_item(sold, 15_000), h.in_item(trade_in, 10_000)]);
    h.engines.approval.approve(negotiation_id, h.actor).unwrap();

    let entry = h.negotiation_ledger(negotiation_id).unwrap();
    h.engines
        .settlement
        .settle(
            entry.ledger_id,
            Money::from_units(5_000),
            h.account,
            PaymentMethod::Transfer,
            h.actor,
        )
        .unwrap();

    let err = h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap_err();
    assert!(matches!(err, Error::NegotiationAlreadySettled { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // Absolutely nothing was unwound.
    assert_eq!(
        h.negotiation_ledger(negotiation_id).unwrap().status,
        LedgerStatus::Paid
    );
    assert_eq!(
        h.store.get_negotiation(&negotiation_id).unwrap().status,
        NegotiationStatus::Approved
    );
    assert_eq!(h.store.get_vehicle(&sold).unwrap().status, VehicleStatus::Sold);
    assert!(h.store.get_vehicle(&trade_in).is_ok());
}

#[test]
fn partially_settled_entries_cancel_without_unwinding_money() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C5", Money::from_units(15_000));
    let negotiation_id = h.draft(vec![h.out_item(sold, 15_000)]);
    h.engines.approval.approve(negotiation_id, h.actor).unwrap();

    let entry = h.negotiation_ledger(negotiation_id).unwrap();
    h.engines
        .settlement
        .settle(
            entry.ledger_id,
            Money::from_units(2_000),
            h.account,
            PaymentMethod::Cash,
            h.actor,
        )
        .unwrap();

    h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap();

    let voided = h.store.get_ledger(&entry.ledger_id).unwrap();
    assert_eq!(voided.status, LedgerStatus::Canceled);
    // The recorded installment and the moved funds both stand.
    assert_eq!(voided.installments.len(), 1);
    assert_eq!(
        h.store.get_account(&h.account).unwrap().balance,
        Money::from_units(22_000)
    );
}

#[test]
fn trade_in_with_service_history_cannot_be_destroyed() {
    let h = harness();
    let sold = h.seed_vehicle("OUT-C6", Money::from_units(15_000));
    let trade_in = h.seed_customer_vehicle("IN-C6");
    let negotiation_id = h.draft(vec![h.out_item(sold, 15_000), h.in_item(trade_in, 10_000)]);
    h.engines.approval.approve(negotiation_id, h.actor).unwrap();

    // Between approval and cancellation the shop opened a service
    // order against the trade-in.
    h.seed_service_order(trade_in, &[350]);

    let err = h.engines.cancellation.cancel(negotiation_id, h.actor).unwrap_err();
    assert!(matches!(err, Error::VehicleInUse { count: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::ReferentialConflict);

    // The veto left no partial reversal behind.
    assert_eq!(
        h.store.get_negotiation(&negotiation_id).unwrap().status,
        NegotiationStatus::Approved
    );
    assert_eq!(
        h.negotiation_ledger(negotiation_id).unwrap().status,
        LedgerStatus::Open
    );
    assert_eq!(h.store.get_vehicle(&sold).unwrap().status, VehicleStatus::Sold);
    assert!(h.store.get_vehicle(&trade_in).is_ok());
}
