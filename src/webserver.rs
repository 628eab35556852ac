use crate::accounting::{Accountant, AccountingError, TransactionRequest};
use crate::metrics::{register_custom_metrics, REGISTRY};
use crate::types::Instrument;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

type Books = Arc<Accountant>;
type JsonReply = WithStatus<Json>;

fn with_books(books: Books) -> impl Filter<Extract = (Books,), Error = Infallible> + Clone {
    warp::any().map(move || books.clone())
}

fn status_for(e: &AccountingError) -> StatusCode {
    match e {
        AccountingError::InvalidTransaction(_) | AccountingError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        AccountingError::UnknownInstrument(_) => StatusCode::NOT_FOUND,
        AccountingError::DuplicateTransaction(_) | AccountingError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
        AccountingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T, AccountingError>, success: StatusCode) -> Result<JsonReply, Infallible> {
    let reply = match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), success),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("{:?}", e);
            }
            let body = json!({ "error": e.to_string(), "retryable": e.is_retryable() });
            warp::reply::with_status(warp::reply::json(&body), status)
        }
    };
    Ok(reply)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[tracing::instrument(skip(books, request))]
async fn post_transaction(request: TransactionRequest, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.process_transaction(request).await, StatusCode::CREATED)
}

#[tracing::instrument(skip(books))]
async fn get_transactions(owner: Uuid, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.transactions(owner).await, StatusCode::OK)
}

#[tracing::instrument(skip(books))]
async fn get_positions(owner: Uuid, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.positions(owner).await, StatusCode::OK)
}

#[tracing::instrument(skip(books))]
async fn get_gains(owner: Uuid, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.realized_gains(owner).await, StatusCode::OK)
}

#[tracing::instrument(skip(books))]
async fn get_portfolio(owner: Uuid, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.portfolio(owner).await, StatusCode::OK)
}

#[tracing::instrument(skip(books))]
async fn get_lots(owner: Uuid, symbol: String, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.open_lots(owner, &symbol).await, StatusCode::OK)
}

#[tracing::instrument(skip(books))]
async fn search_instruments(query: SearchQuery, books: Books) -> Result<JsonReply, Infallible> {
    respond(books.search_instruments(&query.q).await, StatusCode::OK)
}

#[tracing::instrument(skip(books, instrument))]
async fn post_instrument(instrument: Instrument, books: Books) -> Result<JsonReply, Infallible> {
    let symbol = instrument.symbol.clone();
    let result = books.register_instrument(instrument).await;
    let status = match result {
        Ok(true) => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    respond(
        result.map(|created| json!({ "symbol": symbol, "created": created })),
        status,
    )
}

#[tracing::instrument(skip(books))]
async fn get_live_price(symbol: String, books: Books) -> Result<JsonReply, Infallible> {
    let reply = match books.live_price(&symbol).await {
        Ok(Some(price)) => warp::reply::with_status(
            warp::reply::json(&json!({ "symbol": symbol, "current_price": price })),
            StatusCode::OK,
        ),
        Ok(None) => warp::reply::with_status(
            warp::reply::json(&json!({ "error": "Unable to fetch price" })),
            StatusCode::BAD_REQUEST,
        ),
        Err(e) => return respond::<()>(Err(e), StatusCode::OK),
    };
    Ok(reply)
}

async fn metrics_handler() -> Result<impl warp::Reply, warp::Rejection> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("could not encode prometheus metrics: {}", e);
    };
    let res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    Ok(res)
}

#[tracing::instrument(skip(books))]
pub async fn run(port: u16, books: Books) {
    register_custom_metrics();
    let health = warp::path!("health").and(warp::get()).map(|| "");
    let metrics = warp::path!("metrics").and(warp::get()).and_then(metrics_handler);
    let post_transaction = warp::path!("transactions")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_books(books.clone()))
        .and_then(post_transaction);
    let get_transactions = warp::path!("owners" / Uuid / "transactions")
        .and(warp::get())
        .and(with_books(books.clone()))
        .and_then(get_transactions);
    let get_positions = warp::path!("owners" / Uuid / "positions")
        .and(warp::get())
        .and(with_books(books.clone()))
        .and_then(get_positions);
    let get_gains = warp::path!("owners" / Uuid / "gains")
        .and(warp::get())
        .and(with_books(books.clone()))
        .and_then(get_gains);
    let get_portfolio = warp::path!("owners" / Uuid / "portfolio")
        .and(warp::get())
        .and(with_books(books.clone()))
        .and_then(get_portfolio);
    let get_lots = warp::path!("owners" / Uuid / "lots" / String)
        .and(warp::get())
        .and(with_books(books.clone()))
        .and_then(get_lots);
    let search_instruments = warp::path!("instruments")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and(with_books(books.clone()))
        .and_then(search_instruments);
    let post_instrument = warp::path!("instruments")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_books(books.clone()))
        .and_then(post_instrument);
    let get_live_price = warp::path!("instruments" / String / "price")
        .and(warp::get())
        .and(with_books(books))
        .and_then(get_live_price);
    let routes = health
        .or(metrics)
        .or(post_transaction)
        .or(get_transactions)
        .or(get_positions)
        .or(get_gains)
        .or(get_portfolio)
        .or(get_lots)
        .or(search_instruments)
        .or(post_instrument)
        .or(get_live_price);
    let address = SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), port);
    warp::serve(routes).run(address).await
}
