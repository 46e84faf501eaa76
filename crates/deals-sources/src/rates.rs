//! National Bank (nbrb.by) exchange-rate provider
//!
//! Consumes the bank's JSON API. The feed quotes some currencies per 10 or
//! 100 units (`Cur_Scale`); the factory divides the scale out so the cached
//! table is uniformly "BYN per one unit", the convention the converter
//! assumes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use deals_core::{
    ApiResponse, CurrencyExchangeService, ExchangeRates, RateClient, RateResultFactory, Result,
};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::JsonHttpClient;

const BASE_URL: &str = "https://api.nbrb.by";
const RATES_PATH: &str = "/exrates/rates";

pub struct NationalBankClient {
    http: JsonHttpClient,
}

impl NationalBankClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL),
        }
    }
}

#[async_trait]
impl RateClient for NationalBankClient {
    async fn rates_on(&self, date: NaiveDate) -> Result<ApiResponse> {
        let on_date = date.format("%Y-%m-%d").to_string();
        self.http
            .get(RATES_PATH, &[("ondate", on_date.as_str()), ("periodicity", "0")])
            .await
    }
}

pub struct NationalBankRateFactory;

impl RateResultFactory for NationalBankRateFactory {
    fn build(&self, payload: &Value) -> Option<ExchangeRates> {
        let entries = payload.as_array()?;
        let rates: ExchangeRates = entries
            .iter()
            .filter_map(|entry| {
                let code = entry["Cur_Abbreviation"].as_str()?;
                let scale = entry["Cur_Scale"].as_i64().filter(|&scale| scale > 0)?;
                let rate = Decimal::from_f64_retain(entry["Cur_OfficialRate"].as_f64()?)?;
                Some((code.to_string(), rate / Decimal::from(scale)))
            })
            .collect();
        (!rates.is_empty()).then_some(rates)
    }
}

/// Exchange service wired to the national bank, sharing the app's HTTP pool.
pub fn exchange_service(http: reqwest::Client) -> CurrencyExchangeService {
    CurrencyExchangeService::new(
        Arc::new(NationalBankClient::new(http)),
        Arc::new(NationalBankRateFactory),
    )
}
