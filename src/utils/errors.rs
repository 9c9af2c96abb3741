// src/utils/errors.rs

use std::{error::Error, fmt};
use reqwest;
use serde_json;

/// Errors coming from calls to the order service (HTTP, JSON, status).
#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Json(serde_json::Error),
    /// Non-2xx answer the caller did not opt to tolerate.
    Status { status: u16, url: String },
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e)              => write!(f, "HTTP error: {}", e),
            ApiError::Json(e)              => write!(f, "JSON error: {}", e),
            ApiError::Status { status, url } => write!(f, "unexpected status {} from {}", status, url),
            ApiError::Other(msg)           => write!(f, "{}", msg),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Http(e)        => Some(e),
            ApiError::Json(e)        => Some(e),
            ApiError::Status { .. }  => None,
            ApiError::Other(_)       => None,
        }
    }
}

// Conversions from underlying errors into ApiError
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self { ApiError::Http(err) }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self { ApiError::Json(err) }
}

impl From<String> for ApiError {
    fn from(msg: String) -> Self { ApiError::Other(msg) }
}

/// Why a position produced no P&L entry this cycle.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PnlSkip {
    #[error("order has no resolvable id")]
    NoOrderId,
    #[error("incomplete entry data (fill price / quantity missing or zero)")]
    IncompleteEntry,
    #[error("action is neither BUY nor SELL")]
    UnknownAction,
    #[error("malformed instrument descriptor")]
    MalformedInstrument,
    #[error("market depth unavailable")]
    DepthUnavailable,
    #[error("current price is not positive")]
    NonPositivePrice,
    #[error("order details key missing")]
    NoDetailsKey,
    #[error("exit order has no fill price")]
    NoExitFill,
    #[error("backend: {0}")]
    Backend(String),
}

impl PnlSkip {
    /// Short label used as a metrics tag.
    pub fn reason(&self) -> &'static str {
        match self {
            PnlSkip::NoOrderId           => "no_order_id",
            PnlSkip::IncompleteEntry     => "incomplete_entry",
            PnlSkip::UnknownAction       => "unknown_action",
            PnlSkip::MalformedInstrument => "malformed_instrument",
            PnlSkip::DepthUnavailable    => "depth_unavailable",
            PnlSkip::NonPositivePrice    => "non_positive_price",
            PnlSkip::NoDetailsKey        => "no_details_key",
            PnlSkip::NoExitFill          => "no_exit_fill",
            PnlSkip::Backend(_)          => "backend_error",
        }
    }
}

impl From<ApiError> for PnlSkip {
    fn from(err: ApiError) -> Self { PnlSkip::Backend(err.to_string()) }
}
