use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Money, Rate};
use crate::ValuationResult;

use super::comps::ComparableRecord;

const MILLION: Decimal = dec!(1000000);

/// A public company used as a valuation peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerTicker<'a> {
    pub ticker: &'a str,
    pub name: &'a str,
}

/// Listed healthcare technology peers.
pub const DEFAULT_PEERS: [PeerTicker<'static>; 6] = [
    PeerTicker { ticker: "TDOC", name: "Teladoc Health" },
    PeerTicker { ticker: "DOCS", name: "Doximity" },
    PeerTicker { ticker: "VEEV", name: "Veeva Systems" },
    PeerTicker { ticker: "HIMS", name: "Hims & Hers" },
    PeerTicker { ticker: "AMWL", name: "Amwell" },
    PeerTicker { ticker: "OSCR", name: "Oscar Health" },
];

/// Raw fundamentals for one ticker as returned by a market data provider,
/// in whole currency units. Missing fields are treated as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchedFinancials {
    #[serde(default)]
    pub market_cap: Money,
    #[serde(default)]
    pub total_revenue: Money,
    #[serde(default)]
    pub enterprise_value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<Rate>,
}

/// Anything that can look up fundamentals for a ticker.
pub trait ComparableSource {
    fn fetch(&self, ticker: &str) -> ValuationResult<FetchedFinancials>;
}

impl ComparableRecord {
    /// Convert a raw fetch into millions and derive EV/Revenue.
    pub fn from_fetched(ticker: &str, name: &str, fetched: &FetchedFinancials) -> Self {
        let revenue = fetched.total_revenue / MILLION;
        let enterprise_value = fetched.enterprise_value / MILLION;
        let ev_revenue = if revenue > Decimal::ZERO {
            enterprise_value.checked_div(revenue)
        } else {
            None
        };

        ComparableRecord {
            ticker: ticker.to_string(),
            name: name.to_string(),
            market_cap: fetched.market_cap / MILLION,
            revenue,
            enterprise_value,
            ev_revenue,
            revenue_growth: fetched.revenue_growth,
        }
    }
}

/// Fetch every peer from `source`, skipping tickers that fail or report no
/// revenue. Never fails as a whole; an empty result is valid.
pub fn collect_comparables<S: ComparableSource + ?Sized>(
    source: &S,
    peers: &[PeerTicker<'_>],
) -> Vec<ComparableRecord> {
    let mut records = Vec::with_capacity(peers.len());

    for peer in peers {
        match source.fetch(peer.ticker) {
            Ok(fetched) if fetched.total_revenue > Decimal::ZERO => {
                records.push(ComparableRecord::from_fetched(peer.ticker, peer.name, &fetched));
            }
            Ok(_) => {
                warn!(ticker = peer.ticker, "no revenue reported, skipping peer");
            }
            Err(e) => {
                warn!(ticker = peer.ticker, error = %e, "error fetching peer, skipping");
            }
        }
    }

    debug!(requested = peers.len(), collected = records.len(), "peer collection complete");
    records
}
