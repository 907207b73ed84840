use crate::ListingSource;
use async_trait::async_trait;
use common::{
    models::{CoinRow, ListingTable, QuoteCurrency, RawListing, QUOTE_ORDER},
    Error, Result,
};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

const COINMARKETCAP_URL: &str = "https://coinmarketcap.com/";

/// The page bootstraps its client from one JSON blob in this element.
const BOOTSTRAP_SELECTOR: &str = r#"script#__NEXT_DATA__[type="application/json"]"#;

/// Fixed path from the payload root to the listings array.
const LISTINGS_PATH: [&str; 5] = [
    "props",
    "initialState",
    "cryptocurrency",
    "listingLatest",
    "data",
];

pub struct CoinMarketCapConnector {
    client: reqwest::Client,
    url: String,
}

impl CoinMarketCapConnector {
    pub fn new() -> Self {
        Self::with_url(COINMARKETCAP_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Single GET of the listings page. No retries, no caching here;
    /// non-success statuses are surfaced as network errors.
    async fn fetch_page(&self) -> Result<String> {
        debug!("Fetching listings page: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for CoinMarketCapConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the bootstrap `<script>` element and parse its text as JSON.
pub fn extract_bootstrap_json(html: &str) -> Result<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(BOOTSTRAP_SELECTOR).unwrap();

    let element = document.select(&selector).next().ok_or_else(|| {
        Error::MarkupNotFound(format!("no element matching `{}`", BOOTSTRAP_SELECTOR))
    })?;

    let text: String = element.text().collect();
    serde_json::from_str(text.trim()).map_err(|e| Error::MalformedPayload(e.to_string()))
}

/// Walk the fixed path to the listings array. A missing or wrongly-typed
/// segment means the site restructured its payload.
pub fn listings_from_payload(payload: &Value) -> Result<&Vec<Value>> {
    let mut node = payload;
    let mut walked = String::new();
    for segment in LISTINGS_PATH {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
        node = node
            .get(segment)
            .ok_or_else(|| Error::SchemaError(format!("missing payload segment `{walked}`")))?;
    }
    node.as_array()
        .ok_or_else(|| Error::SchemaError(format!("`{walked}` is not an array")))
}

/// Confirm every listing carries exactly one quote per entry of
/// [`QUOTE_ORDER`] before any row is projected. The payload does not
/// label quote positions, so a count mismatch is the only reordering
/// signal available; it must fail loudly rather than corrupt prices.
pub fn validate_quote_layout(listings: &[Value]) -> Result<()> {
    for entry in listings {
        let symbol = entry
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        let quotes = entry
            .get("quotes")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::SchemaError(format!("listing `{symbol}` has no `quotes` array"))
            })?;
        if quotes.len() != QUOTE_ORDER.len() {
            return Err(Error::SchemaError(format!(
                "listing `{symbol}` carries {} quotes, expected {}",
                quotes.len(),
                QUOTE_ORDER.len()
            )));
        }
    }
    Ok(())
}

/// Project listings into flat rows for one quote currency, lazily and
/// in upstream order.
pub fn normalize_listings<'a>(
    listings: &'a [Value],
    currency: QuoteCurrency,
) -> impl Iterator<Item = Result<CoinRow>> + 'a {
    let index = currency.quote_index();
    listings
        .iter()
        .map(move |entry| project_listing(entry, index))
}

fn project_listing(entry: &Value, index: usize) -> Result<CoinRow> {
    let symbol = entry
        .get("symbol")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();

    let listing: RawListing = serde_json::from_value(entry.clone())
        .map_err(|e| Error::SchemaError(format!("listing `{symbol}` has unexpected shape: {e}")))?;

    let quote = listing.quotes.get(index).ok_or_else(|| {
        Error::SchemaError(format!(
            "listing `{}` has no quote at index {index}",
            listing.symbol
        ))
    })?;

    Ok(CoinRow {
        market_cap: quote.market_cap,
        percent_change_1h: quote.percent_change_1h,
        percent_change_24h: quote.percent_change_24h,
        percent_change_7d: quote.percent_change_7d,
        price: quote.price,
        volume_24h: quote.volume_24h,
        name: listing.name.clone(),
        symbol: listing.symbol.clone(),
    })
}

#[async_trait]
impl ListingSource for CoinMarketCapConnector {
    async fn fetch_listings(&self, currency: QuoteCurrency) -> Result<ListingTable> {
        let html = self.fetch_page().await?;
        let payload = extract_bootstrap_json(&html)?;
        let listings = listings_from_payload(&payload)?;
        validate_quote_layout(listings)?;

        let rows = normalize_listings(listings, currency).collect::<Result<Vec<CoinRow>>>()?;

        info!("Normalized {} listings under {}", rows.len(), currency);
        Ok(ListingTable::new(currency, rows))
    }
}
