//! Backend wire shapes → canonical records.
//!
//! The order service has grown several response shapes over time: the
//! broker id may sit under different keys, numbers may arrive as strings,
//! legacy top-level fields linger next to the newer `brokerResponse`
//! payload. All of that is absorbed here, once per fetched record.

use serde::Deserialize;
use serde_json::Value;

use super::models::{Action, BrokerFill, EntryPrice, Instrument, MarketDepth, Order};

/* ─────────────────────────────────────────  wire structs ────── */

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBrokerResponse {
    pub broker_order_id: Option<Value>,
    pub norenordno: Option<Value>,
    pub exchordid: Option<Value>,
    #[serde(alias = "avgprc", alias = "averagePrice")]
    pub fill_price: Option<Value>,
    #[serde(alias = "fillshares", alias = "filledQuantity")]
    pub fill_quantity: Option<Value>,
    #[serde(alias = "stat")]
    pub status: Option<Value>,
    #[serde(alias = "rejreason")]
    pub rejection_reason: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    pub order_id: Option<Value>,
    pub exchange_order_no: Option<Value>,
    pub order_details_key: Option<Value>,
    pub strategy_id: Option<Value>,
    pub leg_id: Option<Value>,
    pub symbol: Option<Value>,
    #[serde(alias = "strikePrice")]
    pub strike: Option<Value>,
    pub option_type: Option<Value>,
    #[serde(alias = "expiryDate")]
    pub expiry: Option<Value>,
    #[serde(alias = "transactionType", alias = "side")]
    pub action: Option<Value>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,
    pub broker_response: Option<RawBrokerResponse>,
    pub entered: Option<Value>,
    pub exited: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLevel {
    pub price: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDepth {
    pub bid_values: Option<Vec<RawLevel>>,
    pub ask_values: Option<Vec<RawLevel>>,
    pub ltp: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEntryPrice {
    #[serde(alias = "price")]
    pub entry_price: Option<Value>,
    pub quantity: Option<Value>,
    pub source: Option<Value>,
}

/// `{ orders: [...] | null }`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LiveDetailsEnvelope {
    pub orders: Option<Vec<Value>>,
}

/// `{ data: T | null }`
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
}

/* ─────────────────────────────────────────  scalar coercion ─ */

/// Non-empty text from a string or number.
fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        _ => None,
    }
}

/// Finite number from a number or numeric string.
fn number(v: Option<&Value>) -> Option<f64> {
    let f = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        _ => false,
    }
}

/* ─────────────────────────────────────────  public API ────── */

/// Broker id (two historical keys) → client `orderId` → exchange order number.
/// First non-empty value wins.
pub fn resolve_order_id(raw: &RawOrder) -> Option<String> {
    let broker = raw.broker_response.as_ref();
    text(broker.and_then(|b| b.broker_order_id.as_ref()))
        .or_else(|| text(broker.and_then(|b| b.norenordno.as_ref())))
        .or_else(|| text(raw.order_id.as_ref()))
        .or_else(|| text(raw.exchange_order_no.as_ref()))
        .or_else(|| text(broker.and_then(|b| b.exchordid.as_ref())))
}

pub fn normalize_order(raw: &RawOrder) -> Order {
    let broker = raw
        .broker_response
        .as_ref()
        .map(|b| BrokerFill {
            fill_price: number(b.fill_price.as_ref()),
            fill_quantity: number(b.fill_quantity.as_ref()),
            status: text(b.status.as_ref()),
            rejection_reason: text(b.rejection_reason.as_ref()),
        })
        .unwrap_or_default();

    Order {
        id: resolve_order_id(raw),
        details_key: text(raw.order_details_key.as_ref()),
        strategy_id: text(raw.strategy_id.as_ref()),
        leg_id: text(raw.leg_id.as_ref()),
        instrument: Instrument {
            symbol: text(raw.symbol.as_ref()),
            strike: text(raw.strike.as_ref()),
            option_type: text(raw.option_type.as_ref()).map(|s| s.to_ascii_uppercase()),
            expiry: text(raw.expiry.as_ref()),
        },
        action: text(raw.action.as_ref()).and_then(|s| Action::parse(&s)),
        quantity: number(raw.quantity.as_ref()),
        price: number(raw.price.as_ref()),
        broker,
        entered: flag(raw.entered.as_ref()),
        exited: flag(raw.exited.as_ref()),
    }
}

/// Decodes one element of the live-details list. Elements that are not
/// order objects yield `None` and are dropped by the caller.
pub fn order_from_value(v: Value) -> Option<Order> {
    match serde_json::from_value::<RawOrder>(v) {
        Ok(raw) => Some(normalize_order(&raw)),
        Err(e) => {
            log::warn!("dropping undecodable order record: {e}");
            None
        }
    }
}

pub fn normalize_depth(raw: &RawDepth) -> MarketDepth {
    let best = |levels: &Option<Vec<RawLevel>>| {
        levels
            .as_ref()
            .and_then(|l| l.first())
            .and_then(|lvl| number(lvl.price.as_ref()))
    };
    MarketDepth {
        best_bid: best(&raw.bid_values),
        best_ask: best(&raw.ask_values),
        ltp: number(raw.ltp.as_ref()),
    }
}

pub fn normalize_entry_price(raw: &RawEntryPrice) -> EntryPrice {
    EntryPrice {
        entry_price: number(raw.entry_price.as_ref()),
        quantity: number(raw.quantity.as_ref()),
        source: text(raw.source.as_ref()),
    }
}
