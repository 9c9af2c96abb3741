use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use metrics_exporter_prometheus::PrometheusBuilder;

use optdesk_monitor::{
    config::settings::Settings,
    middleware::metrics::Metrics,
    routes::{health::health_scope, monitor::monitor_scope},
    services::{orders::BackendClient, poller::OrderPoller},
};


fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    log::info!("Starting optdesk monitor…");

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        std::process::exit(1);
    });

    let prometheus = PrometheusBuilder::new().install_recorder()?;

    let client = BackendClient::new(&settings.backend_url)?;
    let poller = web::Data::new(OrderPoller::new(Arc::new(client), settings.poll_interval()));

    // --- strategies polled from boot -------------------------------------
    for id in &settings.autostart_strategies {
        poller.start(id);
    }

    let app_poller = poller.clone();
    let port = settings.server_port;
    log::info!(
        "backend {} · poll every {:?} · listening on :{port}",
        settings.backend_url,
        settings.poll_interval()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Metrics)
            .wrap(Logger::default())
            .app_data(app_poller.clone())
            .app_data(web::Data::new(prometheus.clone()))

            //scope
            .service(monitor_scope())
            .service(health_scope())
    })
        .bind(("0.0.0.0", port))?
        .run()
        .await?;

    poller.shutdown();
    Ok(())
}
