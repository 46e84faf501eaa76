//! Domain Models
//!
//! Normalized types every source adapter must produce, plus the exchange-rate
//! table. Price amounts are `i64` minor units (cents/kopecks); rate arithmetic
//! uses `rust_decimal` - never use f64 for money.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Base currency: native prices are assumed to be BYN unless stated otherwise.
pub const BYN: &str = "BYN";
/// Russian rouble - the one "foreign" native currency among the sources.
pub const RUB: &str = "RUB";
/// Secondary display currency appended to every convertible price.
pub const USD: &str = "USD";

/// Exchange-rate table for one calendar day.
///
/// Keyed by 3-letter currency code; the value is BYN per **one unit** of that
/// currency (the provider's scale is divided out when the table is built).
pub type ExchangeRates = HashMap<String, Decimal>;

/// A price in minor units of some currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in minor units (e.g. cents). Never negative.
    pub amount: i64,

    /// 3-letter currency code
    pub currency: String,
}

impl Price {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Price in the base currency
    pub fn byn(amount: i64) -> Self {
        Self::new(amount, BYN)
    }
}

/// Where a listed item is located
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLocation {
    pub area: String,
    pub city: String,
    pub country: String,
}

/// Who listed the item (classifieds sources only)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOwner {
    pub id: String,
    pub name: String,

    /// Link to the owner's profile, when the source exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One normalized sale listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSearchResult {
    pub description: String,
    pub images: Vec<String>,
    pub location: Option<GameLocation>,
    pub owner: Option<GameOwner>,

    /// `prices[0]` is the native price as extracted; later entries are derived
    /// conversions appended in a fixed order (BYN->USD, or RUB->BYN->USD).
    /// Entries are only ever appended, never rewritten.
    pub prices: Vec<Price>,

    /// Marketplace identifier
    pub source: String,

    /// Listing title
    pub subject: String,

    /// Canonical link to the listing
    pub url: String,
}

impl GameSearchResult {
    /// Native price amount used as the ascending sort key.
    ///
    /// A listing without a price sorts as 0, i.e. first.
    pub fn sort_price(&self) -> i64 {
        self.prices.first().map_or(0, |price| price.amount)
    }
}
