// src/routes/monitor.rs

use actix_web::dev::HttpServiceFactory;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde::Serialize;

use crate::middleware::path_logger::PathLogger;
use crate::services::orders::models::PositionPnl;
use crate::services::poller::{OrderPoller, StrategyView};
use crate::utils::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct PollState {
    pub strategy_id: String,
    pub running: bool,
}

/// GET /api/monitor – ids with an active polling loop
#[get("")]
pub async fn list_running(poller: web::Data<OrderPoller>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok(poller.running()))
}

/// POST /api/monitor/{strategy_id}/start
#[post("/{strategy_id}/start")]
pub async fn start_polling(
    poller: web::Data<OrderPoller>,
    path: web::Path<String>,
) -> impl Responder {
    let strategy_id = path.into_inner();
    poller.start(&strategy_id);
    HttpResponse::Ok().json(ApiResponse::ok(PollState {
        strategy_id,
        running: true,
    }))
}

/// POST /api/monitor/{strategy_id}/stop
#[post("/{strategy_id}/stop")]
pub async fn stop_polling(
    poller: web::Data<OrderPoller>,
    path: web::Path<String>,
) -> impl Responder {
    let strategy_id = path.into_inner();
    if poller.stop(&strategy_id) {
        HttpResponse::Ok().json(ApiResponse::ok(PollState {
            strategy_id,
            running: false,
        }))
    } else {
        HttpResponse::NotFound().json(ApiResponse::<()>::err(format!(
            "strategy '{strategy_id}' is not being polled"
        )))
    }
}

/// DELETE /api/monitor/{strategy_id} – stop polling and drop the view
#[delete("/{strategy_id}")]
pub async fn forget_strategy(
    poller: web::Data<OrderPoller>,
    path: web::Path<String>,
) -> impl Responder {
    let strategy_id = path.into_inner();
    if poller.forget(&strategy_id) {
        HttpResponse::Ok().json(ApiResponse::ok(PollState {
            strategy_id,
            running: false,
        }))
    } else {
        HttpResponse::NotFound().json(ApiResponse::<()>::err("no data for strategy"))
    }
}

/// GET /api/monitor/{strategy_id}
#[get("/{strategy_id}")]
pub async fn strategy_view(
    poller: web::Data<OrderPoller>,
    path: web::Path<String>,
) -> impl Responder {
    match poller.view(&path) {
        Some(v) => HttpResponse::Ok().json(ApiResponse::<StrategyView>::ok(v)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::err("no data for strategy")),
    }
}

/// GET /api/monitor/{strategy_id}/pnl
#[get("/{strategy_id}/pnl")]
pub async fn strategy_pnl(
    poller: web::Data<OrderPoller>,
    path: web::Path<String>,
) -> impl Responder {
    match poller.view(&path) {
        Some(v) => {
            let mut rows: Vec<PositionPnl> = v.pnl.into_values().collect();
            rows.sort_by(|a, b| a.order_id.cmp(&b.order_id));
            HttpResponse::Ok().json(ApiResponse::ok(rows))
        }
        None => HttpResponse::NotFound().json(ApiResponse::<()>::err("no data for strategy")),
    }
}

/// GET /api/monitor/{strategy_id}/entry-price/{details_key} – proxied lookup
#[get("/{strategy_id}/entry-price/{details_key}")]
pub async fn entry_price(
    poller: web::Data<OrderPoller>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (strategy_id, details_key) = path.into_inner();
    match poller.api().entry_price(&strategy_id, &details_key).await {
        Ok(Some(ep)) => HttpResponse::Ok().json(ApiResponse::ok(ep)),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::err("entry price not found")),
        Err(e) => {
            log::error!("entry_price: backend error: {e}");
            HttpResponse::BadGateway().json(ApiResponse::<()>::err(format!("backend error: {e}")))
        }
    }
}

pub fn monitor_scope() -> impl HttpServiceFactory {
    web::scope("/api/monitor")
        .wrap(PathLogger)
        .service(list_running)
        .service(start_polling)
        .service(stop_polling)
        .service(strategy_pnl)
        .service(entry_price)
        .service(forget_strategy)
        .service(strategy_view)
}
