use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

use startup_valuation_core::valuation::peers::{ComparableSource, FetchedFinancials};
use startup_valuation_core::{ValuationError, ValuationResult};

use super::file::resolve_path;

/// One row of a market data export, in whole currency units.
#[derive(Debug, Deserialize)]
struct PeerRow {
    ticker: String,
    #[serde(default)]
    market_cap: Option<Decimal>,
    #[serde(default)]
    total_revenue: Option<Decimal>,
    #[serde(default)]
    enterprise_value: Option<Decimal>,
    #[serde(default)]
    revenue_growth: Option<Decimal>,
}

/// Peer fundamentals loaded from a CSV export with the header
/// `ticker,market_cap,total_revenue,enterprise_value,revenue_growth`.
pub struct CsvPeerSource {
    rows: HashMap<String, FetchedFinancials>,
}

impl CsvPeerSource {
    pub fn from_path(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let canonical = resolve_path(path)?;
        let file = std::fs::File::open(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = HashMap::new();

        for record in rdr.deserialize() {
            let row: PeerRow = record?;
            rows.insert(
                row.ticker.to_uppercase(),
                FetchedFinancials {
                    market_cap: row.market_cap.unwrap_or_default(),
                    total_revenue: row.total_revenue.unwrap_or_default(),
                    enterprise_value: row.enterprise_value.unwrap_or_default(),
                    revenue_growth: row.revenue_growth,
                },
            );
        }

        Ok(CsvPeerSource { rows })
    }
}

impl ComparableSource for CsvPeerSource {
    fn fetch(&self, ticker: &str) -> ValuationResult<FetchedFinancials> {
        self.rows
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| ValuationError::InsufficientData(format!("no data for {ticker}")))
    }
}
