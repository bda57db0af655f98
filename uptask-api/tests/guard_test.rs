/// Project/task resolution guards
///
/// Unknown projects and tasks are rejected before any handler runs, and a
/// task is only reachable through the project it belongs to.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

fn task_body() -> serde_json::Value {
    json!({ "name": "T", "description": "D" })
}

#[tokio::test]
async fn test_unknown_project_is_404_on_every_task_route() {
    let ctx = TestContext::new();
    let project = Uuid::new_v4();
    let task = Uuid::new_v4();

    let cases = [
        (Method::POST, format!("/api/projects/{project}/tasks"), Some(task_body())),
        (Method::GET, format!("/api/projects/{project}/tasks"), None),
        (Method::GET, format!("/api/projects/{project}/tasks/{task}"), None),
        (Method::PUT, format!("/api/projects/{project}/tasks/{task}"), Some(task_body())),
        (Method::DELETE, format!("/api/projects/{project}/tasks/{task}"), None),
        (
            Method::POST,
            format!("/api/projects/{project}/tasks/{task}/status"),
            Some(json!({ "status": "completed" })),
        ),
    ];

    for (method, uri, body) in cases {
        let (status, body) = ctx.request(method.clone(), &uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["message"], "Proyecto no encontrado");
    }
}

#[tokio::test]
async fn test_malformed_project_id_is_404() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/projects/not-an-id/tasks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Proyecto no encontrado");
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let ctx = TestContext::new();
    let project = ctx.create_project("P1").await;
    let task = Uuid::new_v4();

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = ctx
            .request(method, &format!("/api/projects/{project}/tasks/{task}"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Tarea no encontrada");
    }
}

#[tokio::test]
async fn test_malformed_task_id_is_400() {
    let ctx = TestContext::new();
    let project = ctx.create_project("P1").await;

    let (status, body) = ctx.get(&format!("/api/projects/{project}/tasks/123")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "taskId");
    assert_eq!(body["errors"][0]["message"], "ID no válido");
}

#[tokio::test]
async fn test_task_of_another_project_is_400_for_every_method() {
    let ctx = TestContext::new();
    let owner = ctx.create_project("Owner").await;
    let other = ctx.create_project("Other").await;
    let task = ctx.create_task(&owner, "T1").await;

    let uri = format!("/api/projects/{other}/tasks/{task}");
    let cases = [
        (Method::GET, uri.clone(), None),
        (Method::PUT, uri.clone(), Some(task_body())),
        (Method::DELETE, uri.clone(), None),
        (
            Method::POST,
            format!("{uri}/status"),
            Some(json!({ "status": "completed" })),
        ),
    ];

    for (method, uri, body) in cases {
        let (status, body) = ctx.request(method.clone(), &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["message"], "Acción no válida");
    }

    // Nothing was changed through the foreign project
    let (status, body) = ctx.get(&format!("/api/projects/{owner}/tasks/{task}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "T1");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_project_by_id_rules() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/projects/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "id");
    assert_eq!(body["errors"][0]["message"], "El ID no es válido");

    let (status, body) = ctx.delete(&format!("/api/projects/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Proyecto no encontrado");
}

#[tokio::test]
async fn test_path_and_body_errors_are_reported_together() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .put("/api/projects/abc", json!({ "projectName": "", "clientName": "C" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["description", "id", "projectName"]);
}
