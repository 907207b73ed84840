pub mod coinmarketcap;

use async_trait::async_trait;
use common::{
    models::{ListingTable, QuoteCurrency},
    Result,
};

/// Trait defining the interface for listing data sources
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the live listings and materialize them as a table under
    /// the given quote currency. All-or-nothing: any fetch, markup or
    /// schema failure aborts before a partial table exists.
    async fn fetch_listings(&self, currency: QuoteCurrency) -> Result<ListingTable>;
}
