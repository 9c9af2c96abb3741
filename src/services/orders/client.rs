//! Production adapter that talks to the order service's REST API.
//! Implements the `OrderApi` trait expected by the poller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::api::OrderApi;
use super::models::{EntryPrice, Instrument, MarketDepth, Order};
use super::normalize::{
    normalize_depth, normalize_entry_price, normalize_order, order_from_value, DataEnvelope,
    LiveDetailsEnvelope, RawDepth, RawEntryPrice, RawOrder,
};
use crate::utils::errors::ApiError;

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Other(format!("bad backend url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Other(format!("backend url '{base_url}' cannot be a base")));
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    /// `{base}/strategy-orders/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("strategy-orders").extend(segments);
        }
        url
    }

    /// GET + decode. With `tolerate_404`, a 404 is `Ok(None)` instead of an error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        tolerate_404: bool,
    ) -> Result<Option<T>, ApiError> {
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND && tolerate_404 {
            log::debug!("GET {url} → 404, treated as absent");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[async_trait]
impl OrderApi for BackendClient {
    async fn live_orders(&self, strategy_id: &str) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["get", strategy_id, "live-details"]);
        let env: LiveDetailsEnvelope = self.get_json(url, false).await?.unwrap_or_default();

        Ok(env
            .orders
            .unwrap_or_default()
            .into_iter()
            .filter_map(order_from_value)
            .collect())
    }

    async fn exit_order(&self, details_key: &str) -> Result<Option<Order>, ApiError> {
        let url = self.endpoint(&["exit-order", details_key]);
        let env: Option<DataEnvelope<RawOrder>> = self.get_json(url, true).await?;
        Ok(env.and_then(|e| e.data).map(|raw| normalize_order(&raw)))
    }

    async fn market_depth(&self, instrument: &Instrument) -> Result<Option<MarketDepth>, ApiError> {
        let [symbol, strike, option_type, expiry] = instrument
            .depth_segments()
            .ok_or_else(|| ApiError::Other("instrument descriptor incomplete".into()))?;

        let url = self.endpoint(&["depth", symbol, strike, option_type, expiry]);
        let env: Option<DataEnvelope<RawDepth>> = self.get_json(url, true).await?;
        Ok(env.and_then(|e| e.data).map(|raw| normalize_depth(&raw)))
    }

    async fn entry_price(
        &self,
        strategy_id: &str,
        details_key: &str,
    ) -> Result<Option<EntryPrice>, ApiError> {
        let url = self.endpoint(&["entry-price", strategy_id, details_key]);
        let env: Option<DataEnvelope<RawEntryPrice>> = self.get_json(url, true).await?;
        Ok(env.and_then(|e| e.data).map(|raw| normalize_entry_price(&raw)))
    }
}
