use crate::helpers::setup;
use chrono::{Duration, Utc};
use futures::future::join_all;
use portfolio_ledger::types::Side;
use portfolio_ledger::TransactionRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_double_consume_a_lot() {
    let app = Arc::new(setup().await);
    let bought_at = Utc::now() - Duration::days(3);
    app.accountant
        .process_transaction(
            TransactionRequest::new(app.owner, "TCS", Side::Buy, dec!(8))
                .price(dec!(100))
                .at(bought_at),
        )
        .await
        .unwrap();

    let sales = (0..2).map(|_| {
        let app = app.clone();
        tokio::spawn(async move {
            app.accountant
                .process_transaction(TransactionRequest::new(app.owner, "TCS", Side::Sell, dec!(5)).price(dec!(110)))
                .await
        })
    });
    let mut splits: Vec<_> = join_all(sales)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().gain_split.unwrap())
        .collect();
    splits.sort_by_key(|split| split.unmatched_quantity);

    assert_eq!(splits[0].unmatched_quantity, Decimal::ZERO);
    assert_eq!(splits[0].short_term, dec!(50));
    assert_eq!(splits[1].unmatched_quantity, dec!(2));
    assert_eq!(splits[1].short_term, dec!(30));

    let matches = app.accountant.lot_matches(app.owner, "TCS").await.unwrap();
    let consumed: Decimal = matches.iter().map(|m| m.quantity).sum();
    assert_eq!(consumed, dec!(8));
    assert!(app.accountant.open_lots(app.owner, "TCS").await.unwrap().is_empty());
    assert_eq!(app.accountant.positions(app.owner).await.unwrap()[0].quantity, Decimal::ZERO);
    assert_eq!(app.accountant.realized_gains(app.owner).await.unwrap()[0].realized, dec!(80));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_keep_every_lot() {
    let app = Arc::new(setup().await);
    let buys = (1..=20).map(|i| {
        let app = app.clone();
        let symbol = if i % 2 == 0 { "TCS" } else { "INFY" };
        tokio::spawn(async move {
            app.accountant
                .process_transaction(
                    TransactionRequest::new(app.owner, symbol, Side::Buy, dec!(1)).price(Decimal::from(i * 10)),
                )
                .await
        })
    });
    for joined in join_all(buys).await {
        joined.unwrap().unwrap();
    }

    let positions = app.accountant.positions(app.owner).await.unwrap();
    assert_eq!(positions.len(), 2);
    for position in &positions {
        assert_eq!(position.quantity, dec!(10));
        let lots = app.accountant.open_lots(app.owner, &position.symbol).await.unwrap();
        assert_eq!(lots.len(), 10);
        let cost: Decimal = lots.iter().map(|lot| lot.unit_cost).sum();
        assert_eq!((position.average_cost * position.quantity).round_dp(6), cost);
    }
}
