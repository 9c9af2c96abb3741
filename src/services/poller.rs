//! Per-strategy order polling.
//!
//! One tokio task per strategy: fetch the live order set, derive P&L for
//! every entered leg, publish both into a shared view map. The abort
//! handles live in a registry owned by the `OrderPoller` itself, so two
//! pollers never share state and dropping one stops all its loops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::{abortable, AbortHandle};
use metrics::{histogram, increment_counter};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::orders::api::OrderApi;
use crate::services::orders::models::{Order, PositionPnl};
use crate::services::pnl::derive_pnl_streaming;

type TaskMap = DashMap<String, AbortHandle>;
type ViewMap = DashMap<String, StrategyView>;

/// Everything a consumer needs to render one strategy's orders table.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyView {
    pub orders: Vec<Order>,
    pub pnl: HashMap<String, PositionPnl>,
    /// Last order-list fetch failure; cleared by the next success.
    pub error: Option<String>,
    pub loading: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub running: bool,
}

pub struct OrderPoller {
    api: Arc<dyn OrderApi>,
    period: Duration,
    tasks: TaskMap,
    views: Arc<ViewMap>,
}

impl OrderPoller {
    pub fn new(api: Arc<dyn OrderApi>, period: Duration) -> Self {
        Self {
            api,
            period,
            tasks: TaskMap::default(),
            views: Arc::new(ViewMap::default()),
        }
    }

    pub fn api(&self) -> &Arc<dyn OrderApi> {
        &self.api
    }

    /// Fetches now, then every `period` until stopped. Starting an id that
    /// is already running replaces its loop. Must be called inside a tokio runtime.
    pub fn start(&self, strategy_id: &str) {
        let (task, abort) = abortable(poll_loop(
            strategy_id.to_string(),
            Arc::clone(&self.api),
            Arc::clone(&self.views),
            self.period,
        ));

        if let Some(previous) = self.tasks.insert(strategy_id.to_string(), abort) {
            previous.abort();
            log::info!("poller: restarted '{strategy_id}'");
        } else {
            log::info!("poller: started '{strategy_id}' every {:?}", self.period);
        }

        tokio::spawn(task);
    }

    /// Cancels the loop for `strategy_id`. Returns `false` if none was running.
    /// The last published view stays readable until `forget`.
    pub fn stop(&self, strategy_id: &str) -> bool {
        match self.tasks.remove(strategy_id) {
            Some((_, abort)) => {
                abort.abort();
                if let Some(mut v) = self.views.get_mut(strategy_id) {
                    v.loading = false;
                }
                log::info!("poller: stopped '{strategy_id}'");
                true
            }
            None => false,
        }
    }

    /// Stops the loop and evicts the view. Returns `false` if there was
    /// neither a loop nor a view for `strategy_id`.
    pub fn forget(&self, strategy_id: &str) -> bool {
        let stopped = self.stop(strategy_id);
        let evicted = self.views.remove(strategy_id).is_some();
        if evicted {
            log::info!("poller: forgot '{strategy_id}'");
        }
        stopped || evicted
    }

    /// Stops every loop.
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.stop(&id);
        }
    }

    pub fn is_running(&self, strategy_id: &str) -> bool {
        self.tasks.contains_key(strategy_id)
    }

    pub fn running(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn view(&self, strategy_id: &str) -> Option<StrategyView> {
        self.views.get(strategy_id).map(|v| {
            let mut v = v.clone();
            v.running = self.is_running(strategy_id);
            v
        })
    }
}

impl Drop for OrderPoller {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

async fn poll_loop(
    strategy_id: String,
    api: Arc<dyn OrderApi>,
    views: Arc<ViewMap>,
    period: Duration,
) {
    let mut iv = interval(period);
    iv.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // cycles may overlap; dropping the set (loop aborted) aborts them all
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            _ = iv.tick() => {
                let id = strategy_id.clone();
                let api = Arc::clone(&api);
                let views = Arc::clone(&views);
                cycles.spawn(async move { poll_once(&id, api.as_ref(), &views).await });
            }
            Some(done) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(e) = done {
                    log::error!("poller: '{strategy_id}' cycle failed: {e}");
                }
            }
        }
    }
}

/// One cycle: mark loading, fetch and publish the order set, then publish
/// each leg's P&L as soon as it resolves. A leg that never resolves holds
/// back nothing but its own entry.
pub(crate) async fn poll_once(strategy_id: &str, api: &dyn OrderApi, views: &ViewMap) {
    let previous_pnl = {
        let mut v = views.entry(strategy_id.to_string()).or_default();
        v.loading = true;
        v.pnl.clone()
    };

    let started = Instant::now();
    let orders = match api.live_orders(strategy_id).await {
        Ok(orders) => orders,
        Err(e) => {
            increment_counter!("order_poll_total", "outcome" => "error");
            log::warn!("poller: '{strategy_id}' order fetch failed: {e}");

            // keep the stale snapshot, only surface the error
            if let Some(mut v) = views.get_mut(strategy_id) {
                v.error = Some(format!("Failed to fetch orders: {e}"));
                v.loading = false;
            }
            return;
        }
    };
    increment_counter!("order_poll_total", "outcome" => "ok");
    histogram!("order_poll_latency_ms", started.elapsed().as_secs_f64() * 1_000.0);

    match views.get_mut(strategy_id) {
        Some(mut v) => {
            v.orders = orders.clone();
            v.error = None;
            v.loading = false;
            v.updated_at = Some(Utc::now());
        }
        // forgotten while the fetch was in flight
        None => return,
    }

    let pnl = derive_pnl_streaming(api, &orders, &previous_pnl, |p| {
        if let Some(mut v) = views.get_mut(strategy_id) {
            v.pnl.insert(p.order_id.clone(), p.clone());
        }
    })
    .await;

    // whole batch in: drop entries for legs that no longer price
    if let Some(mut v) = views.get_mut(strategy_id) {
        v.pnl.retain(|id, _| pnl.contains_key(id));
    }
}
