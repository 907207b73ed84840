use serde::{Deserialize, Serialize};

/// Display currency for prices and market metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuoteCurrency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
}

/// The positional layout of the `quotes` array in the upstream payload.
///
/// The listings page carries exactly one quote record per currency, in
/// this order, with nothing in the payload labelling the positions. Keep
/// the contract in one place so a layout change is a one-line fix.
pub const QUOTE_ORDER: [QuoteCurrency; 3] =
    [QuoteCurrency::Btc, QuoteCurrency::Eth, QuoteCurrency::Usd];

impl QuoteCurrency {
    /// Index of this currency's quote record within a listing's `quotes`.
    pub fn quote_index(&self) -> usize {
        QUOTE_ORDER
            .iter()
            .position(|c| c == self)
            .expect("QUOTE_ORDER lists every currency")
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "USD" => Some(QuoteCurrency::Usd),
            "BTC" => Some(QuoteCurrency::Btc),
            "ETH" => Some(QuoteCurrency::Eth),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuoteCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteCurrency::Usd => write!(f, "USD"),
            QuoteCurrency::Btc => write!(f, "BTC"),
            QuoteCurrency::Eth => write!(f, "ETH"),
        }
    }
}

/// Percent-change time frame shown in the table and chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChangeWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
}

impl ChangeWindow {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(ChangeWindow::OneHour),
            "24h" => Some(ChangeWindow::TwentyFourHours),
            "7d" => Some(ChangeWindow::SevenDays),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeWindow::OneHour => write!(f, "1h"),
            ChangeWindow::TwentyFourHours => write!(f, "24h"),
            ChangeWindow::SevenDays => write!(f, "7d"),
        }
    }
}

/// One cryptocurrency as it appears in the upstream bootstrap payload
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    pub name: String,
    pub symbol: String,
    pub quotes: Vec<RawQuote>,
}

/// A currency-denominated snapshot of one listing's market metrics.
///
/// Every field is required; a listing missing any of them is rejected
/// rather than filled with a default, since a silently-wrong price is
/// worse than a visible failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub market_cap: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub price: f64,
    pub volume_24h: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_index_matches_upstream_layout() {
        assert_eq!(QuoteCurrency::Btc.quote_index(), 0);
        assert_eq!(QuoteCurrency::Eth.quote_index(), 1);
        assert_eq!(QuoteCurrency::Usd.quote_index(), 2);
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        assert_eq!(QuoteCurrency::parse("usd"), Some(QuoteCurrency::Usd));
        assert_eq!(QuoteCurrency::parse("BTC"), Some(QuoteCurrency::Btc));
        assert_eq!(QuoteCurrency::parse("doge"), None);
    }

    #[test]
    fn change_window_parse_round_trips_display() {
        for w in [
            ChangeWindow::OneHour,
            ChangeWindow::TwentyFourHours,
            ChangeWindow::SevenDays,
        ] {
            assert_eq!(ChangeWindow::parse(&w.to_string()), Some(w));
        }
    }

    #[test]
    fn raw_quote_rejects_missing_field() {
        let json = r#"{
            "marketCap": 1.0,
            "percentChange1h": 0.1,
            "percentChange24h": 0.2,
            "percentChange7d": 0.3,
            "volume24h": 4.0
        }"#;
        assert!(serde_json::from_str::<RawQuote>(json).is_err());
    }
}
