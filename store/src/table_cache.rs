use common::models::{ListingTable, QuoteCurrency};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-scoped cache of materialized tables, keyed by quote currency.
///
/// The listings page does not vary by any other control, so this is the
/// only key the scrape pipeline is invalidated on. Symbol filters, top-N
/// and sorting all run against the cached table without a re-fetch.
#[derive(Default)]
pub struct TableCache {
    tables: RwLock<HashMap<QuoteCurrency, Arc<ListingTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, currency: QuoteCurrency) -> Option<Arc<ListingTable>> {
        self.tables.read().await.get(&currency).cloned()
    }

    pub async fn insert(&self, table: ListingTable) -> Arc<ListingTable> {
        let currency = table.currency;
        let table = Arc::new(table);
        self.tables.write().await.insert(currency, Arc::clone(&table));
        debug!("Cached {} table with {} rows", currency, table.len());
        table
    }

    /// Drop the table for one currency so the next request re-fetches.
    pub async fn invalidate(&self, currency: QuoteCurrency) {
        if self.tables.write().await.remove(&currency).is_some() {
            debug!("Invalidated cached {} table", currency);
        }
    }

    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }
}
