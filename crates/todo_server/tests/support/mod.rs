#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use todo_core::db::open_db_in_memory;
use todo_server::{build_router, AppState};
use tower::ServiceExt;

/// Router over a fresh in-memory database.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        Self {
            router: build_router(AppState::new(conn)),
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body.to_string())).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(raw) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(raw)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Creates a todo and returns its id.
    pub async fn create_todo(&self, text: &str) -> String {
        let (status, body) = self
            .post("/api/todos", serde_json::json!({ "text": text }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        id_of(&body["data"])
    }

    /// Creates a sub-todo under `todo_id` and returns its id.
    pub async fn create_sub_todo(&self, todo_id: &str, text: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/todos/{todo_id}/subtodos"),
                serde_json::json!({ "text": text }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        id_of(&body["data"])
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}
