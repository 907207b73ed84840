mod listing;
mod table;

pub use listing::{ChangeWindow, QuoteCurrency, RawListing, RawQuote, QUOTE_ORDER};
pub use table::{ChartSeries, CoinRow, ListingTable, PercentChangeRow, SortColumn};
