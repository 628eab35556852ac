use portfolio_ledger::instrument_import::{import_instruments, ImportSummary};
use portfolio_ledger::types::Venue;
use portfolio_ledger::LedgerStore;

use crate::helpers::setup;

const LISTING: &str = "\
SYMBOL,NAME OF COMPANY, SERIES, DATE OF LISTING, FACE VALUE
WIPRO,Wipro Limited,EQ,08-NOV-1995,2
 HDFCBANK , HDFC Bank Limited ,EQ,08-NOV-1995,1
TCS,Tata Consultancy Services Limited,EQ,25-AUG-2004,1
WIPRO,Wipro Limited,EQ,08-NOV-1995,2
";

#[tokio::test]
async fn listing_registers_new_instruments_once() {
    let app = setup().await;

    let summary = import_instruments(&app.accountant, LISTING.as_bytes(), Venue::Nse)
        .await
        .unwrap();
    assert_eq!(summary, ImportSummary { created: 2, skipped: 2 });

    let hdfc = app.store.instrument("HDFCBANK").await.unwrap().unwrap();
    assert_eq!(hdfc.name, "HDFC Bank Limited");
    assert_eq!(hdfc.quote_symbol(), "HDFCBANK.NS");
    // Existing instruments keep their name
    let tcs = app.store.instrument("TCS").await.unwrap().unwrap();
    assert_eq!(tcs.name, "Tata Consultancy Services");

    let again = import_instruments(&app.accountant, LISTING.as_bytes(), Venue::Nse)
        .await
        .unwrap();
    assert_eq!(again, ImportSummary { created: 0, skipped: 4 });
}

#[tokio::test]
async fn listing_without_required_columns_is_rejected() {
    let app = setup().await;
    let listing = "TICKER,NAME\nWIPRO,Wipro Limited\n";
    assert!(import_instruments(&app.accountant, listing.as_bytes(), Venue::Nse)
        .await
        .is_err());
    assert!(app.store.instrument("WIPRO").await.unwrap().is_none());
}
