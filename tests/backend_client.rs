// tests/backend_client.rs
//
// Runs `BackendClient` against a throwaway actix-web server that mimics the
// order service's contract.
use std::sync::Arc;
use std::time::Duration;

use actix_web::{dev::ServerHandle, get, web, App, HttpResponse, HttpServer};
use serde_json::json;

use optdesk_monitor::services::orders::{Action, BackendClient, Instrument, OrderApi};
use optdesk_monitor::services::poller::OrderPoller;
use optdesk_monitor::utils::errors::ApiError;

#[get("/strategy-orders/get/{strategy_id}/live-details")]
async fn live_details(path: web::Path<String>) -> HttpResponse {
    match path.as_str() {
        "s-ok" => HttpResponse::Ok().json(json!({
            "orders": [
                {
                    "orderId": "legacy-1",
                    "orderDetailsKey": "dk-open",
                    "strategyId": "s-ok",
                    "legId": "leg-1",
                    "symbol": "NIFTY",
                    "strike": 22000,
                    "optionType": "CE",
                    "expiry": "2026-10-29",
                    "action": "BUY",
                    "quantity": 50,
                    "entered": true,
                    "exited": false,
                    "brokerResponse": { "brokerOrderId": "BRK-1", "fillPrice": 100, "fillQuantity": 50 }
                },
                {
                    "orderId": "legacy-2",
                    "orderDetailsKey": "dk-closed",
                    "symbol": "NIFTY",
                    "strike": "22000",
                    "optionType": "PE",
                    "expiry": "2026-10-29",
                    "transactionType": "buy",
                    "quantity": "10",
                    "entered": true,
                    "exited": true,
                    "brokerResponse": { "norenordno": "NOR-2", "avgprc": "100.00" }
                },
                "not-an-order"
            ]
        })),
        "s-null" => HttpResponse::Ok().json(json!({ "orders": null })),
        _ => HttpResponse::InternalServerError().body("boom"),
    }
}

#[get("/strategy-orders/exit-order/{details_key}")]
async fn exit_order(path: web::Path<String>) -> HttpResponse {
    match path.as_str() {
        "dk-closed" => HttpResponse::Ok().json(json!({
            "data": { "orderId": "exit-2", "brokerResponse": { "fillPrice": 90 } }
        })),
        "dk-null" => HttpResponse::Ok().json(json!({ "data": null })),
        _ => HttpResponse::NotFound().finish(),
    }
}

#[get("/strategy-orders/depth/{symbol}/{strike}/{option_type}/{expiry}")]
async fn depth(path: web::Path<(String, String, String, String)>) -> HttpResponse {
    let (symbol, strike, option_type, _expiry) = path.into_inner();
    match (symbol.as_str(), strike.as_str(), option_type.as_str()) {
        ("NIFTY", "22000", "CE") => HttpResponse::Ok().json(json!({
            "data": {
                "bidValues": [{ "price": 105 }, { "price": 104.5 }],
                "askValues": [{ "price": "105.5" }],
                "ltp": 105.2
            }
        })),
        ("BROKEN", _, _) => HttpResponse::BadGateway().finish(),
        _ => HttpResponse::NotFound().finish(),
    }
}

#[get("/strategy-orders/entry-price/{strategy_id}/{details_key}")]
async fn entry_price(path: web::Path<(String, String)>) -> HttpResponse {
    let (_sid, key) = path.into_inner();
    if key == "dk-open" {
        HttpResponse::Ok().json(json!({
            "data": { "entryPrice": "100.0", "quantity": 50, "source": "broker" }
        }))
    } else {
        HttpResponse::NotFound().finish()
    }
}

async fn spawn_backend() -> (String, ServerHandle) {
    let server = HttpServer::new(|| {
        App::new()
            .service(live_details)
            .service(exit_order)
            .service(depth)
            .service(entry_price)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);
    (format!("http://{addr}"), handle)
}

fn instrument(symbol: &str, option_type: &str) -> Instrument {
    Instrument {
        symbol: Some(symbol.into()),
        strike: Some("22000".into()),
        option_type: Some(option_type.into()),
        expiry: Some("2026-10-29".into()),
    }
}

#[actix_rt::test]
async fn live_orders_are_normalized() {
    let (base, srv) = spawn_backend().await;
    let client = BackendClient::new(&base).unwrap();

    let orders = client.live_orders("s-ok").await.unwrap();
    assert_eq!(orders.len(), 2, "junk element is dropped");

    let open = &orders[0];
    assert_eq!(open.id.as_deref(), Some("BRK-1"));
    assert_eq!(open.details_key.as_deref(), Some("dk-open"));
    assert_eq!(open.leg_id.as_deref(), Some("leg-1"));
    assert_eq!(open.instrument.strike.as_deref(), Some("22000"));
    assert_eq!(open.action, Some(Action::Buy));
    assert_eq!(open.entry_price(), Some(100.0));
    assert!(open.is_open());

    let closed = &orders[1];
    assert_eq!(closed.id.as_deref(), Some("NOR-2"));
    assert_eq!(closed.quantity, Some(10.0));
    assert!(closed.is_closed());

    assert!(client.live_orders("s-null").await.unwrap().is_empty());

    srv.stop(false).await;
}

#[actix_rt::test]
async fn list_failure_is_an_error() {
    let (base, srv) = spawn_backend().await;
    let client = BackendClient::new(&base).unwrap();

    match client.live_orders("s-down").await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }

    srv.stop(false).await;
}

#[actix_rt::test]
async fn lookups_treat_404_as_absent() {
    let (base, srv) = spawn_backend().await;
    let client = BackendClient::new(&base).unwrap();

    let exit = client.exit_order("dk-closed").await.unwrap().unwrap();
    assert_eq!(exit.entry_price(), Some(90.0));
    assert!(client.exit_order("dk-null").await.unwrap().is_none());
    assert!(client.exit_order("dk-missing").await.unwrap().is_none());

    let d = client.market_depth(&instrument("NIFTY", "CE")).await.unwrap().unwrap();
    assert_eq!(d.best_bid, Some(105.0));
    assert_eq!(d.best_ask, Some(105.5));
    assert_eq!(d.ltp, Some(105.2));
    assert!(client.market_depth(&instrument("NIFTY", "PE")).await.unwrap().is_none());
    assert!(client.market_depth(&instrument("BROKEN", "CE")).await.is_err());

    let ep = client.entry_price("s-ok", "dk-open").await.unwrap().unwrap();
    assert_eq!(ep.entry_price, Some(100.0));
    assert_eq!(ep.quantity, Some(50.0));
    assert_eq!(ep.source.as_deref(), Some("broker"));
    assert!(client.entry_price("s-ok", "dk-other").await.unwrap().is_none());

    srv.stop(false).await;
}

#[actix_rt::test]
async fn incomplete_instrument_is_rejected_locally() {
    let client = BackendClient::new("http://127.0.0.1:9").unwrap();
    let mut ins = instrument("NIFTY", "CE");
    ins.expiry = None;
    assert!(matches!(
        client.market_depth(&ins).await,
        Err(ApiError::Other(_))
    ));
}

#[actix_rt::test]
async fn poller_derives_pnl_end_to_end() {
    let (base, srv) = spawn_backend().await;
    let client = BackendClient::new(&base).unwrap();
    let poller = OrderPoller::new(Arc::new(client), Duration::from_millis(50));

    poller.start("s-ok");

    let mut view = None;
    for _ in 0..100 {
        actix_rt::time::sleep(Duration::from_millis(20)).await;
        if let Some(v) = poller.view("s-ok").filter(|v| v.pnl.len() == 2) {
            view = Some(v);
            break;
        }
    }
    let view = view.expect("pnl published");
    assert!(view.running);
    assert!(view.error.is_none());
    assert_eq!(view.pnl["BRK-1"].formatted_pnl(), "250.00");
    assert_eq!(view.pnl["NOR-2"].formatted_pnl(), "-100.00");
    assert!(view.pnl["NOR-2"].exited);

    poller.shutdown();
    srv.stop(false).await;
}
