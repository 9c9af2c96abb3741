// src/services/orders/api.rs

use async_trait::async_trait;

use super::models::{EntryPrice, Instrument, MarketDepth, Order};
use crate::utils::errors::ApiError;

/// Seam between the poller / P&L deriver and the order service.
/// `BackendClient` is the production impl; tests swap in an in-memory one.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Current order set of a strategy. A `null` list is an empty set.
    async fn live_orders(&self, strategy_id: &str) -> Result<Vec<Order>, ApiError>;

    /// Exit order for an entered leg. `Ok(None)` on 404 or `data: null`.
    async fn exit_order(&self, details_key: &str) -> Result<Option<Order>, ApiError>;

    /// Depth snapshot. `Ok(None)` on 404 or `data: null`.
    async fn market_depth(&self, instrument: &Instrument) -> Result<Option<MarketDepth>, ApiError>;

    async fn entry_price(
        &self,
        strategy_id: &str,
        details_key: &str,
    ) -> Result<Option<EntryPrice>, ApiError>;
}
