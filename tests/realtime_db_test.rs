//! REST item store against a stubbed realtime database.

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockroom::errors::ServiceError;
use stockroom::models::item::{Category, Location, StockItem, StockStatus};
use stockroom::store::{ItemStore, RealtimeDbStore};

fn store(server: &MockServer, token: Option<&str>) -> RealtimeDbStore {
    RealtimeDbStore::new(
        server.uri(),
        token.map(str::to_string),
        Duration::from_secs(2),
    )
    .unwrap()
}

fn pillow_item() -> StockItem {
    StockItem::new(
        "Travesseiro de Pena",
        Category::BedLinens,
        Location::RoomB1,
        12,
        12,
        dec!(59.90),
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
    )
    .unwrap()
    .with_supplier("Plumas do Sul")
}

#[tokio::test]
async fn create_posts_document_and_returns_pushed_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items.json"))
        .and(query_param("auth", "db-secret"))
        .and(body_partial_json(json!({
            "name": "Travesseiro de Pena",
            "category": "Roupas de Cama",
            "location": "Sala B1",
            "quantity": 12,
            "minStock": 12,
            "status": "low",
            "supplier": "Plumas do Sul",
            "barcode": null,
            "createdAt": "2024-03-04T10:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "-NqPillow0001" })))
        .expect(1)
        .mount(&server)
        .await;

    let id = store(&server, Some("db-secret"))
        .create("items", &pillow_item())
        .await
        .unwrap();
    assert_eq!(id.as_str(), "-NqPillow0001");
}

#[tokio::test]
async fn rejected_write_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Permission denied" })))
        .mount(&server)
        .await;

    let err = store(&server, None)
        .create("items", &pillow_item())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::ExternalServiceError(ref msg) if msg.contains("401") && msg.contains("Permission denied")
    );
}

#[tokio::test]
async fn list_of_missing_collection_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hotel-sul/items.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let records = store(&server, None).list("hotel-sul/items").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn list_rederives_status_and_skips_malformed_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "-NqB": {
                "name": "Sabonete Líquido",
                "category": "Produtos de Higiene",
                "description": "",
                "quantity": 0,
                "minStock": 20,
                "price": 12.5,
                "location": "Sala C1",
                "status": "normal",
                "createdAt": "2024-01-13T00:00:00Z",
                "lastUpdated": "2024-01-13T00:00:00Z"
            },
            "-NqA": {
                "name": "Kit Amenities Luxo",
                "category": "Amenities",
                "quantity": 200,
                "minStock": 50,
                "price": 25.9,
                "location": "Sala D1",
                "supplier": "Luxo Hotel Supplies",
                "createdAt": "2024-01-10T00:00:00Z",
                "lastUpdated": "2024-01-10T00:00:00Z"
            },
            "-NqC": { "name": "sem categoria", "quantity": -3 }
        })))
        .mount(&server)
        .await;

    let records = store(&server, None).list("items").await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["-NqA", "-NqB"]);

    assert_eq!(records[0].item.supplier.as_deref(), Some("Luxo Hotel Supplies"));
    assert_eq!(records[0].item.price(), dec!(25.9));
    assert_eq!(records[1].item.status(), StockStatus::Out);
    assert_eq!(records[1].item.description, None);
}

#[tokio::test]
async fn list_accepts_array_shaped_collections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            null,
            {
                "name": "Toalhas de Banho",
                "category": "Toalhas",
                "quantity": 45,
                "minStock": 20,
                "price": 35.9,
                "location": "Sala A1",
                "createdAt": "2024-01-15T00:00:00Z",
                "lastUpdated": "2024-01-15T00:00:00Z"
            },
            {
                "name": "Lençóis Queen Size",
                "category": "Roupas de Cama",
                "quantity": 8,
                "minStock": 10,
                "price": 89.9,
                "location": "Sala B1",
                "createdAt": "2024-01-14T00:00:00Z",
                "lastUpdated": "2024-01-14T00:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let records = store(&server, None).list("items").await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
    assert_eq!(records[1].item.status(), StockStatus::Low);
    assert_eq!(records[0].item.location, Location::RoomA1);
}
