use crate::helpers::setup;
use chrono::{Duration, TimeZone, Utc};
use portfolio_ledger::types::{Instrument, Side, Term, Venue};
use portfolio_ledger::{AccountingError, Event, TransactionRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn buy_stamps_charges_and_opens_a_lot() {
    let app = setup().await;
    let processed = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(100)).price(dec!(123.45)))
        .await
        .unwrap();

    let charges = processed.transaction.charges;
    assert_eq!(charges.brokerage, dec!(3.70));
    assert_eq!(charges.transaction_tax, dec!(12.34));
    assert_eq!(charges.clearing_fee, dec!(0.67));
    assert_eq!(charges.regulatory_fee, dec!(0.01));
    assert_eq!(charges.stamp_duty, dec!(0.37));
    assert_eq!(processed.transaction.total_charges(), dec!(17.09));

    assert_eq!(processed.position.quantity, dec!(100));
    assert_eq!(processed.position.average_cost, dec!(123.45));
    let lots = app.accountant.open_lots(app.owner, "TCS").await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].transaction_id, processed.transaction.id);
    assert_eq!(lots[0].remaining, dec!(100));

    let events = app.sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Transaction(t) if t.id == processed.transaction.id));
    assert!(matches!(&events[1], Event::Position(p) if p.quantity == dec!(100)));
}

#[tokio::test]
async fn fifo_sale_realizes_long_term_gain() {
    let app = setup().await;
    let d1 = Utc.with_ymd_and_hms(2022, 4, 1, 9, 30, 0).unwrap();
    for (quantity, price, at) in [(dec!(10), dec!(100), d1), (dec!(5), dec!(120), d1 + Duration::days(10))] {
        app.accountant
            .process_transaction(
                TransactionRequest::new(app.owner, "INFY", Side::Buy, quantity)
                    .price(price)
                    .at(at),
            )
            .await
            .unwrap();
    }
    let sale = app
        .accountant
        .process_transaction(
            TransactionRequest::new(app.owner, "INFY", Side::Sell, dec!(12))
                .price(dec!(150))
                .at(d1 + Duration::days(400)),
        )
        .await
        .unwrap();

    let split = sale.gain_split.unwrap();
    assert_eq!(split.long_term, dec!(560));
    assert_eq!(split.short_term, Decimal::ZERO);
    assert_eq!(split.unmatched_quantity, Decimal::ZERO);
    assert_eq!(sale.transaction.charges.stamp_duty, Decimal::ZERO);

    let position = &app.accountant.positions(app.owner).await.unwrap()[0];
    assert_eq!(position.quantity, dec!(3));
    assert_eq!(position.average_cost.round_dp(4), dec!(106.6667));

    let gains = &app.accountant.realized_gains(app.owner).await.unwrap()[0];
    assert_eq!(gains.realized, dec!(560));
    assert_eq!(gains.long_term, dec!(560));
    assert_eq!(gains.tax_liability, dec!(56));

    let lots = app.accountant.open_lots(app.owner, "INFY").await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].remaining, dec!(3));
    assert_eq!(lots[0].unit_cost, dec!(120));

    let matches = app.accountant.lot_matches(app.owner, "INFY").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.term == Term::LongTerm && m.sell_transaction_id == sale.transaction.id));
    assert!(matches!(app.sink.events().last(), Some(Event::RealizedGains(g)) if g.realized == dec!(560)));
}

#[tokio::test]
async fn gains_accumulate_across_sales() {
    let app = setup().await;
    let d1 = Utc.with_ymd_and_hms(2023, 1, 2, 10, 0, 0).unwrap();
    app.accountant
        .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(10)).price(dec!(100)).at(d1))
        .await
        .unwrap();
    app.accountant
        .process_transaction(
            TransactionRequest::new(app.owner, "TCS", Side::Sell, dec!(4))
                .price(dec!(110))
                .at(d1 + Duration::days(30)),
        )
        .await
        .unwrap();
    app.accountant
        .process_transaction(
            TransactionRequest::new(app.owner, "TCS", Side::Sell, dec!(6))
                .price(dec!(90))
                .at(d1 + Duration::days(500)),
        )
        .await
        .unwrap();

    let gains = &app.accountant.realized_gains(app.owner).await.unwrap()[0];
    assert_eq!(gains.short_term, dec!(40));
    assert_eq!(gains.long_term, dec!(-60));
    assert_eq!(gains.realized, dec!(-20));
    assert_eq!(gains.tax_liability, dec!(0));
    assert!(app.accountant.open_lots(app.owner, "TCS").await.unwrap().is_empty());
    assert_eq!(app.accountant.transactions(app.owner).await.unwrap().len(), 3);
}

#[tokio::test]
async fn overselling_clamps_and_reports_unmatched_quantity() {
    let app = setup().await;
    app.accountant
        .process_transaction(TransactionRequest::new(app.owner, "RELIANCE", Side::Buy, dec!(2)).price(dec!(2500)))
        .await
        .unwrap();
    let sale = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "RELIANCE", Side::Sell, dec!(5)).price(dec!(2600)))
        .await
        .unwrap();
    assert_eq!(sale.position.quantity, Decimal::ZERO);
    let split = sale.gain_split.unwrap();
    assert_eq!(split.unmatched_quantity, dec!(3));
    assert_eq!(split.short_term, dec!(200));
}

#[tokio::test]
async fn rejects_invalid_requests_without_side_effects() {
    let app = setup().await;
    let zero = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Buy, Decimal::ZERO).price(dec!(1)))
        .await;
    assert!(matches!(zero, Err(AccountingError::InvalidTransaction(_))));

    let negative = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(1)).price(dec!(-5)))
        .await;
    assert!(matches!(negative, Err(AccountingError::InvalidTransaction(_))));

    let unknown = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "NOPE", Side::Buy, dec!(1)).price(dec!(1)))
        .await;
    assert!(matches!(unknown, Err(AccountingError::UnknownInstrument(s)) if s == "NOPE"));

    assert!(app.accountant.transactions(app.owner).await.unwrap().is_empty());
    assert!(app.accountant.positions(app.owner).await.unwrap().is_empty());
    assert!(app.sink.events().is_empty());
}

#[tokio::test]
async fn replayed_transaction_id_is_rejected() {
    let app = setup().await;
    let id = Uuid::new_v4();
    let request = TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(1)).price(dec!(10)).id(id);
    app.accountant.process_transaction(request.clone()).await.unwrap();
    let replay = app.accountant.process_transaction(request).await;
    assert!(matches!(replay, Err(AccountingError::DuplicateTransaction(d)) if d == id));
    assert_eq!(app.accountant.positions(app.owner).await.unwrap()[0].quantity, dec!(1));
}

#[tokio::test]
async fn books_are_isolated_by_owner() {
    let app = setup().await;
    let other = Uuid::new_v4();
    app.accountant
        .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(3)).price(dec!(10)))
        .await
        .unwrap();
    app.accountant
        .process_transaction(TransactionRequest::new(other, "TCS", Side::Sell, dec!(3)).price(dec!(10)))
        .await
        .unwrap();
    assert_eq!(app.accountant.open_lots(app.owner, "TCS").await.unwrap()[0].remaining, dec!(3));
    assert_eq!(app.accountant.positions(other).await.unwrap()[0].quantity, Decimal::ZERO);
}

#[tokio::test]
async fn search_and_register_instruments() {
    let app = setup().await;
    let found = app.accountant.search_instruments("tata").await.unwrap();
    let symbols: Vec<_> = found.iter().map(|i| i.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["TATAMOTORS", "TCS"]);

    assert!(matches!(
        app.accountant.search_instruments("   ").await,
        Err(AccountingError::InvalidQuery(_))
    ));

    let wipro = Instrument::new("WIPRO".into(), "Wipro Limited".into(), Venue::Bse);
    assert!(app.accountant.register_instrument(wipro.clone()).await.unwrap());
    assert!(!app.accountant.register_instrument(wipro).await.unwrap());
    assert_eq!(app.accountant.search_instruments("wipro").await.unwrap().len(), 1);
}
