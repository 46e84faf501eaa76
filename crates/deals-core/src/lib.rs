//! # deals-core
//!
//! Concurrent search/aggregation core for the board-game deal aggregator.
//!
//! The crate is transport-free: marketplaces and the exchange-rate provider
//! are reached through the [`search::SearchClient`] and
//! [`currency::RateClient`] traits, so every component here can be exercised
//! against scripted in-memory clients.
//!
//! ## Pieces
//!
//! - [`model`] - normalized result and price types all sources produce
//! - [`search`] - one generic adapter (`SearchService`) parameterized by
//!   injected strategies, plus the concurrent fan-out
//! - [`currency`] - daily exchange-rate cache and price conversion
//! - [`stream`] - single-pass deal-finder stream for server-push delivery

pub mod currency;
pub mod error;
pub mod model;
pub mod search;
pub mod stream;

pub use currency::{Clock, CurrencyExchangeService, RateClient, RateResultFactory, SystemClock};
pub use error::{Result, SearchError};
pub use model::{ExchangeRates, GameLocation, GameOwner, GameSearchResult, Price, BYN, RUB, USD};
pub use search::{
    search_all, ApiResponse, ItemPredicate, ItemsExtractor, ResultFactory, SearchClient,
    SearchService,
};
pub use stream::{ConnectionProbe, DealFinder, NeverDisconnected, SearchEvent};
