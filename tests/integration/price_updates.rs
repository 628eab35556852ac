use crate::helpers::setup;
use portfolio_ledger::{Event, LedgerStore, PriceUpdater};
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn refresh_updates_quoted_instruments_only() {
    let app = setup().await;
    app.prices.set("TCS", dec!(3512.40));
    app.prices.set("INFY", dec!(1450.05));
    let updater = PriceUpdater::new(
        app.store.clone(),
        app.prices.clone(),
        app.sink.clone(),
        Duration::from_secs(60),
    );

    assert_eq!(updater.refresh().await.unwrap(), 2);

    let tcs = app.store.instrument("TCS").await.unwrap().unwrap();
    assert_eq!(tcs.last_price, Some(dec!(3512.40)));
    assert!(tcs.last_priced_at.is_some());
    let reliance = app.store.instrument("RELIANCE").await.unwrap().unwrap();
    assert_eq!(reliance.last_price, None);

    let published: Vec<_> = app
        .sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Price(update) => Some(update.symbol),
            _ => None,
        })
        .collect();
    assert_eq!(published, vec!["INFY".to_string(), "TCS".to_string()]);
}
