use crate::helpers::setup;
use portfolio_ledger::metrics::PRICE_FALLBACKS;
use portfolio_ledger::types::Side;
use portfolio_ledger::TransactionRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn portfolio_marks_open_positions_to_market() {
    let app = setup().await;
    app.prices.set("TCS", dec!(150));
    for (symbol, side, quantity, price) in [
        ("TCS", Side::Buy, dec!(10), dec!(100)),
        ("INFY", Side::Buy, dec!(5), dec!(200)),
        ("RELIANCE", Side::Buy, dec!(1), dec!(2500)),
        ("RELIANCE", Side::Sell, dec!(1), dec!(2600)),
    ] {
        app.accountant
            .process_transaction(TransactionRequest::new(app.owner, symbol, side, quantity).price(price))
            .await
            .unwrap();
    }

    let portfolio = app.accountant.portfolio(app.owner).await.unwrap();
    assert_eq!(portfolio.owner, app.owner);
    assert_eq!(portfolio.holdings.len(), 2);

    let infy = &portfolio.holdings[0];
    assert_eq!(infy.symbol, "INFY");
    assert_eq!(infy.name, "Infosys");
    assert!(!infy.live_price);
    assert_eq!(infy.current_price, dec!(200));
    assert_eq!(infy.unrealized_gain, Decimal::ZERO);

    let tcs = &portfolio.holdings[1];
    assert!(tcs.live_price);
    assert_eq!(tcs.total_investment, dec!(1000));
    assert_eq!(tcs.current_value, dec!(1500));
    assert_eq!(tcs.unrealized_gain, dec!(500));
    assert_eq!(tcs.percentage_return, dec!(50));

    assert_eq!(portfolio.net_worth, dec!(2500));
    assert_eq!(portfolio.total_investment, dec!(2000));
    assert_eq!(portfolio.unrealized_gain, dec!(500));
}

#[tokio::test]
async fn missing_trade_price_uses_live_quote() {
    let app = setup().await;
    app.prices.set("TATAMOTORS", dec!(612.35));
    let processed = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "TATAMOTORS", Side::Buy, dec!(2)))
        .await
        .unwrap();
    assert_eq!(processed.transaction.price, dec!(612.35));
    assert_eq!(
        app.accountant.live_price("TATAMOTORS").await.unwrap(),
        Some(dec!(612.35))
    );
}

#[tokio::test]
async fn failed_quote_falls_back_to_average_cost() {
    let app = setup().await;
    let before = PRICE_FALLBACKS.with_label_values(&["RELIANCE"]).get();
    app.accountant
        .process_transaction(TransactionRequest::new(app.owner, "RELIANCE", Side::Buy, dec!(4)).price(dec!(2400)))
        .await
        .unwrap();
    let sale = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "RELIANCE", Side::Sell, dec!(1)))
        .await
        .unwrap();
    assert_eq!(sale.transaction.price, dec!(2400));
    assert_eq!(sale.gain_split.unwrap().total(), Decimal::ZERO);
    assert!(PRICE_FALLBACKS.with_label_values(&["RELIANCE"]).get() > before);
    assert_eq!(app.accountant.live_price("RELIANCE").await.unwrap(), None);
}

#[tokio::test]
async fn failed_quote_without_position_prices_at_zero() {
    let app = setup().await;
    let processed = app
        .accountant
        .process_transaction(TransactionRequest::new(app.owner, "INFY", Side::Buy, dec!(3)))
        .await
        .unwrap();
    assert_eq!(processed.transaction.price, Decimal::ZERO);
    assert_eq!(processed.transaction.total_charges(), Decimal::ZERO);
    assert_eq!(processed.position.average_cost, Decimal::ZERO);
}
