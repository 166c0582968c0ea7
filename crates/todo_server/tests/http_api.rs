mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::{id_of, TestApp};
use uuid::Uuid;

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new();

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["version"], todo_core::core_version());
}

#[tokio::test]
async fn unknown_route_returns_enveloped_404() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn create_todo_returns_created_view() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/todos", json!({ "text": "Buy milk", "date": "2024-06-01" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["text"], "Buy milk");
    assert_eq!(body["data"]["completed"], false);
    assert_eq!(body["data"]["date"], "2024-06-01");
    assert_eq!(body["data"]["subTodos"], json!([]));
    assert!(Uuid::parse_str(body["data"]["id"].as_str().unwrap()).is_ok());

    let (status, list) = app.get("/api/todos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_todo_reports_every_invalid_field() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/todos", json!({ "date": "06/01/2024", "priority": 1 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let mut fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["field"].as_str().unwrap())
        .collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["date", "priority", "text"]);

    let (_, list) = app.get("/api/todos").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn text_length_limit_is_enforced() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/api/todos", json!({ "text": "가".repeat(255) }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/todos", json!({ "text": "x".repeat(256) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "text");

    let (status, _) = app.post("/api/todos", json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn date_must_use_ascii_digits() {
    let app = TestApp::new();

    for date in ["٢٠٢٤-٠١-٠١", "２０２４-０１-０１"] {
        let (status, body) = app
            .post("/api/todos", json!({ "text": "x", "date": date }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "date");
    }

    let (_, list) = app.get("/api/todos").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/api/todos", Some("{\"text\": ".to_string()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn malformed_path_ids_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/todos/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "id");

    let (status, body) = app
        .put("/api/todos/nope/subtodos/also-nope", json!({ "completed": "yes" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_todo_returns_404() {
    let app = TestApp::new();
    let missing = Uuid::new_v4();

    let (status, body) = app.get(&format!("/api/todos/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .put(&format!("/api/todos/{missing}"), json!({ "completed": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completing_todo_cascades_to_sub_todos() {
    let app = TestApp::new();
    let todo_id = app.create_todo("Pack").await;
    app.create_sub_todo(&todo_id, "socks").await;
    app.create_sub_todo(&todo_id, "charger").await;

    let (status, body) = app
        .put(&format!("/api/todos/{todo_id}"), json!({ "completed": true }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], true);
    let sub_todos = body["data"]["subTodos"].as_array().unwrap();
    assert_eq!(sub_todos.len(), 2);
    assert!(sub_todos.iter().all(|sub| sub["completed"] == true));
}

#[tokio::test]
async fn sub_todo_completion_drives_parent_completion() {
    let app = TestApp::new();
    let todo_id = app.create_todo("Pack").await;
    let socks = app.create_sub_todo(&todo_id, "socks").await;
    let charger = app.create_sub_todo(&todo_id, "charger").await;

    for sub_id in [&socks, &charger] {
        let (status, _) = app
            .put(
                &format!("/api/todos/{todo_id}/subtodos/{sub_id}"),
                json!({ "completed": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = app.get(&format!("/api/todos/{todo_id}")).await;
    assert_eq!(body["data"]["completed"], true);

    app.create_sub_todo(&todo_id, "passport").await;
    let (_, body) = app.get(&format!("/api/todos/{todo_id}")).await;
    assert_eq!(body["data"]["completed"], false);
}

#[tokio::test]
async fn update_todo_clears_date_with_null() {
    let app = TestApp::new();
    let (_, created) = app
        .post("/api/todos", json!({ "text": "Dentist", "date": "2024-06-01" }))
        .await;
    let todo_id = id_of(&created["data"]);

    let (status, body) = app
        .put(&format!("/api/todos/{todo_id}"), json!({ "text": "Dentist (moved)" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["date"], "2024-06-01");

    let (_, body) = app
        .put(&format!("/api/todos/{todo_id}"), json!({ "date": null }))
        .await;
    assert!(body["data"]["date"].is_null());
    assert_eq!(body["data"]["text"], "Dentist (moved)");
}

#[tokio::test]
async fn sub_todo_must_belong_to_addressed_todo() {
    let app = TestApp::new();
    let first = app.create_todo("first").await;
    let second = app.create_todo("second").await;
    let sub_id = app.create_sub_todo(&first, "child").await;

    let (status, _) = app
        .put(
            &format!("/api/todos/{second}/subtodos/{sub_id}"),
            json!({ "text": "moved?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .delete(&format!("/api/todos/{second}/subtodos/{sub_id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
