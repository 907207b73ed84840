use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::{
    models::{ChangeWindow, ChartSeries, ListingTable, PercentChangeRow, QuoteCurrency, SortColumn},
    Error as CommonError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::service::ListingService;

type SharedService = Arc<ListingService>;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const CSV_DISPOSITION: &str = "attachment; filename=\"crypto.csv\"";

// Create a wrapper for our common::Error type
pub struct ApiError(CommonError);

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError(err)
    }
}

// Convert our API error wrapper to an Axum response. Upstream failures
// keep distinct messages so "site unreachable" and "site structure
// changed" stay diagnosable from the client side.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CommonError::NetworkError(e) => (
                StatusCode::BAD_GATEWAY,
                format!("Listings site unreachable: {}", e),
            ),
            CommonError::MarkupNotFound(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Listings site structure changed: {}", msg),
            ),
            CommonError::MalformedPayload(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Listings payload malformed: {}", msg),
            ),
            CommonError::SchemaError(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Listings payload schema changed: {}", msg),
            ),
            CommonError::ParseError(msg) => (StatusCode::BAD_REQUEST, msg),
            CommonError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CommonError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn parse_currency(raw: Option<&str>) -> Result<QuoteCurrency, ApiError> {
    match raw {
        // Default to USD if no currency specified
        None => Ok(QuoteCurrency::Usd),
        Some(s) => QuoteCurrency::parse(s).ok_or_else(|| {
            CommonError::ParseError(format!(
                "Unknown currency: {}. Supported currencies: USD, BTC, ETH",
                s
            ))
            .into()
        }),
    }
}

fn parse_window(raw: Option<&str>) -> Result<ChangeWindow, ApiError> {
    match raw {
        // Default to the 24h column
        None => Ok(ChangeWindow::TwentyFourHours),
        Some(s) => ChangeWindow::parse(s).ok_or_else(|| {
            CommonError::ParseError(format!(
                "Unknown time frame: {}. Supported time frames: 1h, 24h, 7d",
                s
            ))
            .into()
        }),
    }
}

// Comma-separated ticker list; empty/absent means no filtering.
fn parse_symbols(raw: Option<&str>) -> Option<HashSet<String>> {
    let raw = raw?;
    let symbols: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect();
    if symbols.is_empty() {
        None
    } else {
        Some(symbols)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    pub currency: Option<String>,
    pub symbols: Option<String>,
    pub sort: Option<String>,
    pub ascending: Option<bool>,
    pub top: Option<usize>,
}

// Filtered/sorted view of the listings table. Filters always apply as
// symbols, then sort, then top-N, so top-N means "top of the chosen
// ordering".
pub async fn get_listings(
    State(service): State<SharedService>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<ListingTable>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let table = service.table_for(currency).await?;

    let mut view = (*table).clone();
    if let Some(symbols) = parse_symbols(query.symbols.as_deref()) {
        view = view.filter_by_symbols(&symbols);
    }
    if let Some(sort) = query.sort.as_deref() {
        let column = SortColumn::parse(sort).ok_or_else(|| {
            ApiError(CommonError::ParseError(format!(
                "Unknown sort column: {}. Supported columns: market_cap, 1h, 24h, 7d, price, volume_24h",
                sort
            )))
        })?;
        view = view.sort_by_column(column, query.ascending.unwrap_or(true));
    }
    if let Some(top) = query.top {
        view = view.limit_top_n(top);
    }

    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct CsvQuery {
    pub currency: Option<String>,
    pub symbols: Option<String>,
}

// CSV download of the (optionally symbol-filtered) table
pub async fn get_listings_csv(
    State(service): State<SharedService>,
    Query(query): Query<CsvQuery>,
) -> Result<Response, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let table = service.table_for(currency).await?;

    let csv = match parse_symbols(query.symbols.as_deref()) {
        Some(symbols) => table.filter_by_symbols(&symbols).to_csv(),
        None => table.to_csv(),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, CSV_DISPOSITION),
        ],
        csv,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub currency: Option<String>,
    pub symbols: Option<String>,
    pub top: Option<usize>,
}

// The "% price change" companion table with positivity flags
pub async fn get_percent_changes(
    State(service): State<SharedService>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<Vec<PercentChangeRow>>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let table = service.table_for(currency).await?;

    let mut view = (*table).clone();
    if let Some(symbols) = parse_symbols(query.symbols.as_deref()) {
        view = view.filter_by_symbols(&symbols);
    }
    if let Some(top) = query.top {
        view = view.limit_top_n(top);
    }

    Ok(Json(view.percent_change_view()))
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub currency: Option<String>,
    pub window: Option<String>,
    pub symbols: Option<String>,
    pub top: Option<usize>,
}

// Bar-chart series for one percent-change time frame: green for
// gainers, red for losers and flat.
pub async fn get_chart_series(
    State(service): State<SharedService>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartSeries>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let window = parse_window(query.window.as_deref())?;
    let table = service.table_for(currency).await?;

    let mut view = (*table).clone();
    if let Some(symbols) = parse_symbols(query.symbols.as_deref()) {
        view = view.filter_by_symbols(&symbols);
    }
    if let Some(top) = query.top {
        view = view.limit_top_n(top);
    }

    Ok(Json(view.chart_series(window)))
}

#[derive(Debug, Deserialize)]
pub struct SymbolsQuery {
    pub currency: Option<String>,
}

// All tickers in the current table, ascending, for filter controls
pub async fn get_symbols(
    State(service): State<SharedService>,
    Query(query): Query<SymbolsQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let table = service.table_for(currency).await?;
    Ok(Json(table.symbols_sorted()))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub currency: QuoteCurrency,
    pub rows: usize,
}

// Drop the cached table for a currency and re-scrape it
pub async fn refresh_listings(
    State(service): State<SharedService>,
    Query(query): Query<SymbolsQuery>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let table = service.refresh(currency).await?;
    Ok(Json(RefreshResponse {
        currency,
        rows: table.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_defaults_to_usd() {
        assert!(matches!(parse_currency(None), Ok(QuoteCurrency::Usd)));
    }

    #[test]
    fn unknown_currency_is_rejected() {
        assert!(parse_currency(Some("DOGE")).is_err());
    }

    #[test]
    fn window_defaults_to_24h() {
        assert!(matches!(
            parse_window(None),
            Ok(ChangeWindow::TwentyFourHours)
        ));
    }

    #[test]
    fn symbols_are_split_trimmed_and_uppercased() {
        let set = parse_symbols(Some("btc, eth ,XRP,")).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("BTC"));
        assert!(set.contains("ETH"));
        assert!(set.contains("XRP"));
    }

    #[test]
    fn empty_symbol_list_means_no_filter() {
        assert!(parse_symbols(None).is_none());
        assert!(parse_symbols(Some("")).is_none());
        assert!(parse_symbols(Some(" , ")).is_none());
    }

    #[test]
    fn csv_download_is_named_crypto_csv() {
        assert!(CSV_DISPOSITION.contains("crypto.csv"));
    }
}
