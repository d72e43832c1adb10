#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;

use tally_db::{Database, DbConfig};
use tally_server::AppState;

pub const OWNER: &str = "owner";
pub const PASSWORD: &str = "till-key-42";

/// Router over a fresh in-memory database with a seeded owner.
pub async fn app() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.users().upsert_owner(OWNER, PASSWORD).await.unwrap();
    let state = AppState::new(db.clone(), OWNER);
    (tally_server::app(state), db)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post(uri: &str, body: &Value) -> Request<Body> {
    json_request(Method::POST, uri, body)
}

pub fn put(uri: &str, body: &Value) -> Request<Body> {
    json_request(Method::PUT, uri, body)
}

pub fn delete(uri: &str, body: &Value) -> Request<Body> {
    json_request(Method::DELETE, uri, body)
}
