use actix_web::{get, web, HttpResponse, Scope};
use metrics_exporter_prometheus::PrometheusHandle;

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Prometheus scrape endpoint. Needs a `PrometheusHandle` in app data.
#[get("/metrics")]
async fn metrics_scrape(handle: Option<web::Data<PrometheusHandle>>) -> HttpResponse {
    match handle {
        Some(h) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(h.render()),
        None => HttpResponse::ServiceUnavailable().body("metrics recorder not installed"),
    }
}

/// Register last: the empty prefix claims every path not matched before it.
pub fn health_scope() -> Scope {
    web::scope("")
        .service(health_check)
        .service(metrics_scrape)
}
