// src/services/orders/models.rs
//
// Canonical records. Everything in here has already been through
// `normalize`; the multi-field backend shapes never leak past that module.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Some(Action::Buy),
            "SELL" | "S" => Some(Action::Sell),
            _ => None,
        }
    }
}

/// Option contract a leg trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: Option<String>,
    pub strike: Option<String>,
    pub option_type: Option<String>,
    pub expiry: Option<String>,
}

impl Instrument {
    /// `[symbol, strike, optionType, expiry]`, or `None` if any part is missing.
    pub fn depth_segments(&self) -> Option<[&str; 4]> {
        Some([
            self.symbol.as_deref()?,
            self.strike.as_deref()?,
            self.option_type.as_deref()?,
            self.expiry.as_deref()?,
        ])
    }
}

/// What the broker reported back for the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerFill {
    pub fill_price: Option<f64>,
    pub fill_quantity: Option<f64>,
    pub status: Option<String>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Join key between an order and its P&L entry.
    pub id: Option<String>,
    pub details_key: Option<String>,
    pub strategy_id: Option<String>,
    pub leg_id: Option<String>,
    pub instrument: Instrument,
    pub action: Option<Action>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub broker: BrokerFill,
    pub entered: bool,
    pub exited: bool,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.entered && !self.exited
    }

    pub fn is_closed(&self) -> bool {
        self.entered && self.exited
    }

    /// Broker fill price, if present and non-zero.
    pub fn entry_price(&self) -> Option<f64> {
        self.broker.fill_price.filter(|p| *p != 0.0)
    }

    /// Filled quantity, falling back to the requested one. Zero counts as absent.
    pub fn entry_quantity(&self) -> Option<f64> {
        self.broker
            .fill_quantity
            .filter(|q| *q != 0.0)
            .or(self.quantity)
            .filter(|q| *q != 0.0)
    }
}

/// Best bid / ask / last traded price for one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDepth {
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub ltp: Option<f64>,
}

impl MarketDepth {
    /// Price the position could be closed at right now: a long sells into
    /// the bid, a short buys back at the ask.
    pub fn close_price(&self, action: Action) -> Option<f64> {
        match action {
            Action::Buy => self.best_bid,
            Action::Sell => self.best_ask,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPrice {
    pub entry_price: Option<f64>,
    pub quantity: Option<f64>,
    pub source: Option<String>,
}

/// Derived P&L for one entered order. `pnl` is already rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPnl {
    pub order_id: String,
    pub entry_price: f64,
    /// Live close price for open positions, exit fill for closed ones.
    pub current_price: f64,
    #[serde(serialize_with = "fixed_two")]
    pub pnl: f64,
    pub quantity: f64,
    pub action: Action,
    pub exited: bool,
}

impl PositionPnl {
    pub fn formatted_pnl(&self) -> String {
        format!("{:.2}", self.pnl)
    }
}

fn fixed_two<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:.2}", v))
}
