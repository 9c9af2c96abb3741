//! ──────────────────────────────────────────────────────────────────────────
//! Per-position P&L
//! ──────────────────────────────────────────────────────────────────────────
//! * Open leg   – entry fill vs. live close price (bid for longs, ask for shorts)
//! * Closed leg – entry fill vs. exit-order fill; computed once, then reused
//! * Batch      – every entered leg in parallel, joined before returning
//!
//! Nothing in here errors out to the caller: a leg that cannot be priced
//! this cycle is logged and simply has no entry.
//! ──────────────────────────────────────────────────────────────────────────

use std::collections::HashMap;

use futures::future::join_all;
use metrics::increment_counter;

use crate::services::orders::api::OrderApi;
use crate::services::orders::models::{Action, Order, PositionPnl};
use crate::utils::errors::PnlSkip;

/// Signed P&L rounded to cents.
#[inline]
pub fn compute_pnl(action: Action, entry: f64, current: f64, quantity: f64) -> f64 {
    let raw = match action {
        Action::Buy => (current - entry) * quantity,
        Action::Sell => (entry - current) * quantity,
    };
    round2(raw)
}

fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    // keep "-0.00" out of the output
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Id, action, entry price and quantity: what every entered leg needs.
fn entry_terms(order: &Order) -> Result<(String, Action, f64, f64), PnlSkip> {
    let id = order.id.clone().ok_or(PnlSkip::NoOrderId)?;
    let entry = order.entry_price().ok_or(PnlSkip::IncompleteEntry)?;
    let qty = order.entry_quantity().ok_or(PnlSkip::IncompleteEntry)?;
    let action = order.action.ok_or(PnlSkip::UnknownAction)?;
    Ok((id, action, entry, qty))
}

async fn open_position_pnl(api: &dyn OrderApi, order: &Order) -> Result<PositionPnl, PnlSkip> {
    let (order_id, action, entry, quantity) = entry_terms(order)?;

    if order.instrument.depth_segments().is_none() {
        return Err(PnlSkip::MalformedInstrument);
    }

    let depth = api
        .market_depth(&order.instrument)
        .await?
        .ok_or(PnlSkip::DepthUnavailable)?;

    let current = depth
        .close_price(action)
        .filter(|p| *p > 0.0)
        .ok_or(PnlSkip::NonPositivePrice)?;

    Ok(PositionPnl {
        order_id,
        entry_price: entry,
        current_price: current,
        pnl: compute_pnl(action, entry, current, quantity),
        quantity,
        action,
        exited: false,
    })
}

async fn closed_position_pnl(api: &dyn OrderApi, order: &Order) -> Result<PositionPnl, PnlSkip> {
    let (order_id, action, entry, quantity) = entry_terms(order)?;
    let key = order.details_key.as_deref().ok_or(PnlSkip::NoDetailsKey)?;

    let exit = api
        .exit_order(key)
        .await?
        .and_then(|o| o.entry_price())
        .ok_or(PnlSkip::NoExitFill)?;

    Ok(PositionPnl {
        order_id,
        entry_price: entry,
        current_price: exit,
        pnl: compute_pnl(action, entry, exit, quantity),
        quantity,
        action,
        exited: true,
    })
}

fn log_skip(order: &Order, skip: &PnlSkip) {
    increment_counter!("pnl_positions_skipped_total", "reason" => skip.reason());
    let id = order.id.as_deref().unwrap_or("<no id>");
    match skip {
        // will not change until the backend record does
        PnlSkip::MalformedInstrument | PnlSkip::NoOrderId | PnlSkip::NoExitFill => {
            log::warn!("pnl: skipping order {id}: {skip}")
        }
        PnlSkip::Backend(_) => log::warn!("pnl: order {id}: {skip}"),
        _ => log::debug!("pnl: skipping order {id}: {skip}"),
    }
}

/// P&L for one order. `None` for orders that are not entered or that
/// cannot be priced this cycle.
pub async fn position_pnl(api: &dyn OrderApi, order: &Order) -> Option<PositionPnl> {
    if !order.entered {
        return None;
    }
    let res = if order.exited {
        closed_position_pnl(api, order).await
    } else {
        open_position_pnl(api, order).await
    };
    match res {
        Ok(p) => Some(p),
        Err(skip) => {
            log_skip(order, &skip);
            None
        }
    }
}

/// P&L for every entered order, keyed by order id.
///
/// Closed legs that already have an entry in `previous` keep it without a
/// new exit-order fetch; their exit fill is final.
pub async fn derive_pnl(
    api: &dyn OrderApi,
    orders: &[Order],
    previous: &HashMap<String, PositionPnl>,
) -> HashMap<String, PositionPnl> {
    derive_pnl_streaming(api, orders, previous, |_| {}).await
}

/// Same as [`derive_pnl`], but hands each entry to `on_ready` the moment it
/// resolves, so one slow leg does not hold back the others. The returned
/// map is only complete once every leg has resolved.
pub async fn derive_pnl_streaming<F>(
    api: &dyn OrderApi,
    orders: &[Order],
    previous: &HashMap<String, PositionPnl>,
    on_ready: F,
) -> HashMap<String, PositionPnl>
where
    F: Fn(&PositionPnl) + Sync,
{
    let on_ready = &on_ready;
    let mut out = HashMap::new();
    let mut pending = Vec::new();

    for order in orders.iter().filter(|o| o.entered) {
        let settled = order
            .id
            .as_ref()
            .filter(|_| order.exited)
            .and_then(|id| previous.get(id))
            .filter(|p| p.exited);

        match settled {
            Some(p) => {
                on_ready(p);
                out.insert(p.order_id.clone(), p.clone());
            }
            None => pending.push(async move {
                let res = position_pnl(api, order).await;
                if let Some(p) = &res {
                    on_ready(p);
                }
                res
            }),
        }
    }

    for p in join_all(pending).await.into_iter().flatten() {
        out.insert(p.order_id.clone(), p);
    }
    out
}

// ======================================================================
// UNIT TESTS
// ======================================================================
