mod gains;
mod instrument;
mod key;
mod lot;
mod position;
mod transaction;
mod valuation;

pub use gains::{GainSplit, RealizedGains};
pub use instrument::{Instrument, Venue};
pub use key::BookKey;
pub use lot::{Lot, LotMatch, Term};
pub use position::Position;
pub use transaction::{ChargeBreakdown, Side, Transaction};
pub use valuation::{HoldingSummary, PortfolioValuation, PriceUpdate};
