use crate::accounting::Accountant;
use crate::types::{Instrument, Venue};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// One row of an exchange equity listing such as NSE's `EQUITY_L.csv`. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "SYMBOL")]
    symbol: String,
    #[serde(rename = "NAME OF COMPANY")]
    name: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}

fn read_listing<R: Read>(reader: R) -> Result<Vec<ListingRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (line, row) in rdr.deserialize::<ListingRow>().enumerate() {
        let row = row.with_context(|| format!("Malformed listing row {}", line + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Register every listed instrument on `venue`. Instruments that already exist are left untouched.
#[tracing::instrument(skip(accountant, reader))]
pub async fn import_instruments<R: Read>(accountant: &Accountant, reader: R, venue: Venue) -> Result<ImportSummary> {
    let rows = read_listing(reader)?;
    let mut summary = ImportSummary::default();
    for row in rows {
        if row.symbol.is_empty() {
            warn!(name = %row.name, "Listing row without a symbol");
            summary.skipped += 1;
            continue;
        }
        let created = accountant
            .register_instrument(Instrument::new(row.symbol, row.name, venue))
            .await?;
        if created {
            summary.created += 1;
        } else {
            summary.skipped += 1;
        }
    }
    info!(created = summary.created, skipped = summary.skipped, "Imported instrument listing");
    Ok(summary)
}

pub async fn import_instrument_file(accountant: &Accountant, path: &Path) -> Result<ImportSummary> {
    debug!(path = %path.display(), "Opening instrument listing");
    let file = File::open(path).with_context(|| format!("Failed to open instrument listing {}", path.display()))?;
    import_instruments(accountant, file, Venue::Nse).await
}
