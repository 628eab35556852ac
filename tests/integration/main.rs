mod concurrency;
mod helpers;
mod instruments;
mod price_updates;
mod transactions;
mod valuation;
