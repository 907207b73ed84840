use common::{
    models::{ListingTable, QuoteCurrency},
    Result,
};
use connectors::ListingSource;
use std::sync::Arc;
use store::TableCache;
use tracing::{debug, info};

/// Orchestrates the scrape pipeline behind the per-currency cache.
///
/// A table is fetched at most once per currency until it is explicitly
/// refreshed; the pipeline is all-or-nothing, so a failed fetch leaves
/// the cache untouched.
pub struct ListingService {
    source: Arc<dyn ListingSource>,
    cache: Arc<TableCache>,
}

impl ListingService {
    pub fn new(source: Arc<dyn ListingSource>, cache: Arc<TableCache>) -> Self {
        Self { source, cache }
    }

    /// Cached table for the currency, fetching on a miss.
    pub async fn table_for(&self, currency: QuoteCurrency) -> Result<Arc<ListingTable>> {
        if let Some(table) = self.cache.get(currency).await {
            debug!("Serving cached {} table with {} rows", currency, table.len());
            return Ok(table);
        }

        debug!("No cached {} table, fetching from source", currency);
        let table = self.source.fetch_listings(currency).await?;
        info!("Fetched {} table with {} rows", currency, table.len());
        Ok(self.cache.insert(table).await)
    }

    /// Drop the cached table and fetch a fresh one.
    pub async fn refresh(&self, currency: QuoteCurrency) -> Result<Arc<ListingTable>> {
        self.cache.invalidate(currency).await;
        self.table_for(currency).await
    }
}
