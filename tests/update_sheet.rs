use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web::Data};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{Value, json};

use asistencia::model::attendance::PRESENT_MARK;
use asistencia::model::column::Column;
use asistencia::model::event_day::{EventCalendar, EventDay};
use asistencia::registrar::{Registrar, SheetLayout};
use asistencia::routes;
use asistencia::store::MemoryStore;

const PEER: &str = "10.0.0.7:40000";

fn col(s: &str) -> Column {
    s.parse().unwrap()
}

fn layout() -> SheetLayout {
    SheetLayout {
        id_column: col("D"),
        name_column: col("B"),
    }
}

/// Yesterday, today and tomorrow (local), so a run across midnight still
/// lands on an event day.
fn around_today() -> EventCalendar {
    let offset_only = EventCalendar::with_offset_hours(-5, vec![]).unwrap();
    let today = offset_only.local_date(Utc::now());
    let days = [(-1, "H", "I"), (0, "J", "K"), (1, "L", "M")]
        .into_iter()
        .map(|(delta, status, stamp)| EventDay {
            date: today + Duration::days(delta),
            status_column: col(status),
            timestamp_column: col(stamp),
        })
        .collect();
    EventCalendar::with_offset_hours(-5, days).unwrap()
}

fn long_ago() -> EventCalendar {
    let day = EventDay {
        date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        status_column: col("H"),
        timestamp_column: col("I"),
    };
    EventCalendar::with_offset_hours(-5, vec![day]).unwrap()
}

fn seeded() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.set_cell(1, col("B"), "NOMBRE");
    store.set_cell(1, col("D"), "CÉDULA");
    store.set_cell(15, col("B"), "Ana Pérez");
    store.set_cell(15, col("D"), "1029384756");
    store
}

async fn post(
    store: Arc<MemoryStore>,
    calendar: EventCalendar,
    rate: u32,
    bodies: Vec<Value>,
) -> Vec<(StatusCode, Value)> {
    let registrar = Data::new(Registrar::new(store, calendar, layout()));
    let limiter = routes::build_limiter(rate).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(registrar)
            .configure(|cfg| routes::configure(cfg, &limiter)),
    )
    .await;

    let mut out = Vec::new();
    for body in bodies {
        let req = test::TestRequest::post()
            .uri("/update_sheet")
            .peer_addr(PEER.parse::<SocketAddr>().unwrap())
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = if status == StatusCode::TOO_MANY_REQUESTS {
            Value::Null
        } else {
            test::read_body_json(resp).await
        };
        out.push((status, body));
    }
    out
}

#[actix_web::test]
async fn registers_then_rejects_duplicate() {
    let store = seeded();
    let responses = post(
        store.clone(),
        around_today(),
        100,
        vec![json!({"cedula": "1029384756"}), json!({"cedula": " 1029384756 "})],
    )
    .await;

    let (status, body) = &responses[0];
    assert_eq!(*status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["nombre"], "Ana Pérez");

    let (status, body) = &responses[1];
    assert_eq!(*status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("nombre").is_none());

    let marked = ["H", "J", "L"]
        .iter()
        .filter(|c| store.cell(15, col(c)) == PRESENT_MARK)
        .count();
    assert_eq!(marked, 1);
    assert_eq!(store.writes().len(), 2);
}

#[actix_web::test]
async fn non_numeric_cedula_is_rejected() {
    let store = seeded();
    let responses = post(
        store.clone(),
        around_today(),
        100,
        vec![json!({"cedula": "abc123"})],
    )
    .await;

    let (status, body) = &responses[0];
    assert_eq!(*status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        &json!({"success": false, "message": "La cédula debe contener solo números"})
    );
    assert!(store.writes().is_empty());
}

#[actix_web::test]
async fn missing_and_malformed_bodies_are_bad_requests() {
    let store = seeded();
    let responses = post(
        store.clone(),
        around_today(),
        100,
        vec![json!({}), json!({"cedula": ""}), json!({"cedula": 42})],
    )
    .await;

    for (status, body) in &responses {
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
    assert_eq!(responses[0].1["message"], "Cédula no proporcionada.");
    assert!(store.writes().is_empty());
}

#[actix_web::test]
async fn unknown_cedula_is_not_found() {
    let store = seeded();
    let responses = post(
        store.clone(),
        around_today(),
        100,
        vec![json!({"cedula": "999"})],
    )
    .await;

    let (status, body) = &responses[0];
    assert_eq!(*status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cédula no encontrada.");
    assert!(store.writes().is_empty());
}

#[actix_web::test]
async fn outside_the_event_is_rejected() {
    let store = seeded();
    let responses = post(
        store.clone(),
        long_ago(),
        100,
        vec![json!({"cedula": "1029384756"})],
    )
    .await;

    let (status, body) = &responses[0];
    assert_eq!(*status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("no es un día válido"));
    assert!(store.writes().is_empty());
}

#[actix_web::test]
async fn unreachable_store_is_a_generic_500() {
    let store = seeded();
    store.set_unavailable(true);
    let responses = post(
        store.clone(),
        around_today(),
        100,
        vec![json!({"cedula": "1029384756"})],
    )
    .await;

    let (status, body) = &responses[0];
    assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(!body["message"].as_str().unwrap().contains("memory store"));
}

#[actix_web::test]
async fn bursts_beyond_the_limit_are_throttled() {
    let store = seeded();
    let responses = post(
        store,
        around_today(),
        1,
        vec![json!({"cedula": "999"}), json!({"cedula": "999"})],
    )
    .await;

    assert_eq!(responses[0].0, StatusCode::NOT_FOUND);
    assert_eq!(responses[1].0, StatusCode::TOO_MANY_REQUESTS);
}
