use crate::models::{ChangeWindow, QuoteCurrency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One listing projected into the selected quote currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRow {
    pub name: String,
    pub symbol: String,
    pub market_cap: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub price: f64,
    pub volume_24h: f64,
}

impl CoinRow {
    pub fn percent_change(&self, window: ChangeWindow) -> f64 {
        match window {
            ChangeWindow::OneHour => self.percent_change_1h,
            ChangeWindow::TwentyFourHours => self.percent_change_24h,
            ChangeWindow::SevenDays => self.percent_change_7d,
        }
    }

    fn column(&self, column: SortColumn) -> f64 {
        match column {
            SortColumn::MarketCap => self.market_cap,
            SortColumn::PercentChange1h => self.percent_change_1h,
            SortColumn::PercentChange24h => self.percent_change_24h,
            SortColumn::PercentChange7d => self.percent_change_7d,
            SortColumn::Price => self.price,
            SortColumn::Volume24h => self.volume_24h,
        }
    }
}

/// Numeric columns the table can be sorted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SortColumn {
    #[serde(rename = "market_cap")]
    MarketCap,
    #[serde(rename = "1h")]
    PercentChange1h,
    #[serde(rename = "24h")]
    PercentChange24h,
    #[serde(rename = "7d")]
    PercentChange7d,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "volume_24h")]
    Volume24h,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "market_cap" => Some(SortColumn::MarketCap),
            "1h" => Some(SortColumn::PercentChange1h),
            "24h" => Some(SortColumn::PercentChange24h),
            "7d" => Some(SortColumn::PercentChange7d),
            "price" => Some(SortColumn::Price),
            "volume_24h" => Some(SortColumn::Volume24h),
            _ => None,
        }
    }
}

impl From<ChangeWindow> for SortColumn {
    fn from(window: ChangeWindow) -> Self {
        match window {
            ChangeWindow::OneHour => SortColumn::PercentChange1h,
            ChangeWindow::TwentyFourHours => SortColumn::PercentChange24h,
            ChangeWindow::SevenDays => SortColumn::PercentChange7d,
        }
    }
}

/// Data behind the gainers/losers bar chart: one label, value and
/// positivity flag per row, already sorted ascending by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub window: ChangeWindow,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// true → green bar, false → red. Zero counts as non-positive.
    pub positive: Vec<bool>,
}

/// One row of the "% price change" companion table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentChangeRow {
    pub symbol: String,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub positive_1h: bool,
    pub positive_24h: bool,
    pub positive_7d: bool,
}

const CSV_HEADER: &str = "Name,Symbol,Market Cap,1h %,24h %,7d %,Price,Volume (24h)";

/// Ordered table of normalized listings for one quote currency.
///
/// Built once per currency selection; every operation below is a pure
/// transform returning a new table, so derived views never mutate the
/// cached original.
#[derive(Debug, Clone, Serialize)]
pub struct ListingTable {
    pub currency: QuoteCurrency,
    pub scraped_at: DateTime<Utc>,
    pub rows: Vec<CoinRow>,
}

impl ListingTable {
    pub fn new(currency: QuoteCurrency, rows: Vec<CoinRow>) -> Self {
        Self {
            currency,
            scraped_at: Utc::now(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep rows whose symbol is in the set, preserving row order.
    pub fn filter_by_symbols(&self, symbols: &HashSet<String>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|row| symbols.contains(&row.symbol))
            .cloned()
            .collect();
        Self {
            currency: self.currency,
            scraped_at: self.scraped_at,
            rows,
        }
    }

    /// Keep the first n rows of the current order. n is clamped to
    /// [1, row count]; on an empty table the result is empty.
    pub fn limit_top_n(&self, n: usize) -> Self {
        let take = if self.rows.is_empty() {
            0
        } else {
            n.clamp(1, self.rows.len())
        };
        Self {
            currency: self.currency,
            scraped_at: self.scraped_at,
            rows: self.rows[..take].to_vec(),
        }
    }

    /// Stable sort on a numeric column; ties keep their prior relative
    /// order in both directions.
    pub fn sort_by_column(&self, column: SortColumn, ascending: bool) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let (x, y) = (a.column(column), b.column(column));
            if ascending {
                x.total_cmp(&y)
            } else {
                y.total_cmp(&x)
            }
        });
        Self {
            currency: self.currency,
            scraped_at: self.scraped_at,
            rows,
        }
    }

    /// Serialize to comma-delimited text with a header row. Numbers use
    /// plain f64 formatting: period decimal separator, no grouping.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv_field(&row.name));
            out.push(',');
            out.push_str(&csv_field(&row.symbol));
            for value in [
                row.market_cap,
                row.percent_change_1h,
                row.percent_change_24h,
                row.percent_change_7d,
                row.price,
                row.volume_24h,
            ] {
                out.push(',');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }

    /// Bar-chart series for one time frame: rows sorted ascending by
    /// that frame's percent change, one bar per row.
    pub fn chart_series(&self, window: ChangeWindow) -> ChartSeries {
        let sorted = self.sort_by_column(window.into(), true);
        let values: Vec<f64> = sorted
            .rows
            .iter()
            .map(|row| row.percent_change(window))
            .collect();
        ChartSeries {
            window,
            labels: sorted.rows.iter().map(|row| row.symbol.clone()).collect(),
            positive: values.iter().map(|v| *v > 0.0).collect(),
            values,
        }
    }

    /// All symbols in ascending order, for the filter control's options.
    pub fn symbols_sorted(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.rows.iter().map(|row| row.symbol.clone()).collect();
        symbols.sort();
        symbols
    }

    /// Symbol plus the three change columns and their positivity flags.
    pub fn percent_change_view(&self) -> Vec<PercentChangeRow> {
        self.rows
            .iter()
            .map(|row| PercentChangeRow {
                symbol: row.symbol.clone(),
                percent_change_1h: row.percent_change_1h,
                percent_change_24h: row.percent_change_24h,
                percent_change_7d: row.percent_change_7d,
                positive_1h: row.percent_change_1h > 0.0,
                positive_24h: row.percent_change_24h > 0.0,
                positive_7d: row.percent_change_7d > 0.0,
            })
            .collect()
    }
}

// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, symbol: &str, chg_24h: f64) -> CoinRow {
        CoinRow {
            name: name.to_string(),
            symbol: symbol.to_string(),
            market_cap: 1000.0,
            percent_change_1h: 0.5,
            percent_change_24h: chg_24h,
            percent_change_7d: -1.5,
            price: 42.0,
            volume_24h: 99.0,
        }
    }

    fn sample_table() -> ListingTable {
        ListingTable::new(
            QuoteCurrency::Usd,
            vec![
                row("Bitcoin", "BTC", 2.0),
                row("Ethereum", "ETH", -3.0),
                row("XRP", "XRP", 2.0),
            ],
        )
    }

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let table = sample_table();
        let keep: HashSet<String> = ["BTC".to_string(), "XRP".to_string()].into();
        let filtered = table.filter_by_symbols(&keep);
        let symbols: Vec<&str> = filtered.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "XRP"]);
    }

    #[test]
    fn filter_single_symbol() {
        let table = sample_table();
        let keep: HashSet<String> = ["BTC".to_string()].into();
        let filtered = table.filter_by_symbols(&keep);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].symbol, "BTC");
    }

    #[test]
    fn filter_then_limit_preserves_subsequence_order() {
        let table = sample_table();
        let keep: HashSet<String> = ["ETH".to_string(), "XRP".to_string()].into();
        let result = table.filter_by_symbols(&keep).limit_top_n(2);
        let symbols: Vec<&str> = result.rows.iter().map(|r| r.symbol.as_str()).collect();
        // Subsequence of the original BTC, ETH, XRP order
        assert_eq!(symbols, vec!["ETH", "XRP"]);
    }

    #[test]
    fn limit_clamps_to_row_count() {
        let table = sample_table();
        assert_eq!(table.limit_top_n(100).len(), 3);
        assert_eq!(table.limit_top_n(0).len(), 1);
        assert_eq!(table.limit_top_n(2).len(), 2);
    }

    #[test]
    fn limit_on_empty_table_stays_empty() {
        let table = ListingTable::new(QuoteCurrency::Usd, vec![]);
        assert!(table.limit_top_n(5).is_empty());
    }

    #[test]
    fn sort_descending_reverses_ascending_without_duplicates() {
        let table = ListingTable::new(
            QuoteCurrency::Usd,
            vec![
                row("A", "AAA", 3.0),
                row("B", "BBB", -1.0),
                row("C", "CCC", 2.0),
            ],
        );
        let asc = table.sort_by_column(SortColumn::PercentChange24h, true);
        let desc = table.sort_by_column(SortColumn::PercentChange24h, false);
        let mut reversed = asc.rows.clone();
        reversed.reverse();
        assert_eq!(reversed, desc.rows);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let table = sample_table();
        // BTC and XRP tie on 2.0; BTC precedes XRP originally
        let sorted = table.sort_by_column(SortColumn::PercentChange24h, true);
        let symbols: Vec<&str> = sorted.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "BTC", "XRP"]);
    }

    #[test]
    fn limit_one_after_ascending_sort_picks_minimum() {
        let table = sample_table();
        let top = table
            .sort_by_column(SortColumn::PercentChange24h, true)
            .limit_top_n(1);
        assert_eq!(top.rows[0].percent_change_24h, -3.0);
    }

    #[test]
    fn csv_round_trips_cell_values() {
        let table = sample_table();
        let csv = table.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        for (line, original) in lines.zip(&table.rows) {
            let cells: Vec<&str> = line.split(',').collect();
            assert_eq!(cells.len(), 8);
            assert_eq!(cells[0], original.name);
            assert_eq!(cells[1], original.symbol);
            assert_eq!(cells[2].parse::<f64>().unwrap(), original.market_cap);
            assert_eq!(cells[3].parse::<f64>().unwrap(), original.percent_change_1h);
            assert_eq!(cells[4].parse::<f64>().unwrap(), original.percent_change_24h);
            assert_eq!(cells[5].parse::<f64>().unwrap(), original.percent_change_7d);
            assert_eq!(cells[6].parse::<f64>().unwrap(), original.price);
            assert_eq!(cells[7].parse::<f64>().unwrap(), original.volume_24h);
        }
        assert_eq!(csv.lines().count(), table.len() + 1);
    }

    #[test]
    fn csv_quotes_names_containing_commas() {
        let table = ListingTable::new(QuoteCurrency::Usd, vec![row("Wei, Inc", "WEI", 1.0)]);
        let csv = table.to_csv();
        assert!(csv.contains("\"Wei, Inc\",WEI"));
    }

    #[test]
    fn chart_series_sorts_ascending_and_flags_zero_as_red() {
        let table = ListingTable::new(
            QuoteCurrency::Usd,
            vec![
                row("A", "AAA", 1.5),
                row("B", "BBB", 0.0),
                row("C", "CCC", -2.0),
            ],
        );
        let series = table.chart_series(ChangeWindow::TwentyFourHours);
        assert_eq!(series.labels, vec!["CCC", "BBB", "AAA"]);
        assert_eq!(series.values, vec![-2.0, 0.0, 1.5]);
        assert_eq!(series.positive, vec![false, false, true]);
    }

    #[test]
    fn symbols_sorted_ascending() {
        let table = ListingTable::new(
            QuoteCurrency::Usd,
            vec![row("Z", "ZRX", 0.0), row("A", "ADA", 0.0), row("M", "MKR", 0.0)],
        );
        assert_eq!(table.symbols_sorted(), vec!["ADA", "MKR", "ZRX"]);
    }

    #[test]
    fn percent_change_view_flags_positives_only() {
        let table = ListingTable::new(
            QuoteCurrency::Usd,
            vec![CoinRow {
                name: "Bitcoin".to_string(),
                symbol: "BTC".to_string(),
                market_cap: 1.0,
                percent_change_1h: 0.0,
                percent_change_24h: 1.0,
                percent_change_7d: -1.0,
                price: 1.0,
                volume_24h: 1.0,
            }],
        );
        let view = table.percent_change_view();
        assert!(!view[0].positive_1h);
        assert!(view[0].positive_24h);
        assert!(!view[0].positive_7d);
    }
}
