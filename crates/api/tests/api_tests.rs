use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use taskboard_api::{create_app, routes::create_routes, AppState, MetricsRoute};
use taskboard_application::{
    BulkMutationCoordinator, Clock, DashboardService, FixedClock, TodoService,
};
use taskboard_config::ApiConfig;
use taskboard_domain::entities::{Priority, TaskStatus};
use taskboard_domain::repositories::{TaskMutationGateway, TaskStore};
use taskboard_testing_utils::{
    days_ago, fixed_now, tasks_with, FailingTaskStore, FailurePoint, InMemoryTaskStore,
};
use tower::ServiceExt;

fn state_over(store: &InMemoryTaskStore) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(fixed_now()));
    let shared = Arc::new(store.clone());

    AppState {
        dashboard: Arc::new(DashboardService::new(shared.clone(), clock.clone())),
        bulk: Arc::new(BulkMutationCoordinator::new(shared.clone(), clock.clone())),
        todos: Arc::new(TodoService::new(shared.clone(), clock)),
        store_health: shared,
        metrics: None,
    }
}

fn failing_state(point: FailurePoint) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(fixed_now()));
    let failing = Arc::new(FailingTaskStore::new(point));
    let store: Arc<dyn TaskStore> = failing.clone();
    let gateway: Arc<dyn TaskMutationGateway> = failing.clone();

    AppState {
        dashboard: Arc::new(DashboardService::new(store, clock.clone())),
        bulk: Arc::new(BulkMutationCoordinator::new(gateway, clock.clone())),
        todos: Arc::new(TodoService::new(Arc::new(InMemoryTaskStore::new()), clock)),
        store_health: failing,
        metrics: None,
    }
}

fn seeded_store() -> InMemoryTaskStore {
    InMemoryTaskStore::with_tasks(tasks_with(3, |id, b| match id {
        1 => b.with_status(TaskStatus::Done).completed(true),
        2 => b.with_status(TaskStatus::InProgress),
        _ => b.with_priority(Priority::High),
    }))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // axum 的提取器拒绝返回纯文本
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_routes(state_over(&InMemoryTaskStore::new()));
    let (status, json) = send(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");
    assert_eq!(json["service"], "taskboard");
}

#[tokio::test]
async fn test_health_check_reports_unreachable_store() {
    let app = create_routes(failing_state(FailurePoint::Everything));
    let (status, json) = send(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"], "unavailable");
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = create_routes(state_over(&seeded_store()));
    let (status, json) = send(app, Method::GET, "/api/dashboard/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalTodos"], 3);
    assert_eq!(json["completedTodos"], 1);
    assert_eq!(json["inProgressTodos"], 1);
    assert_eq!(json["highPriorityTodos"], 1);
    assert_eq!(json["completionRate"], 33.3);
    assert_eq!(json["todosByStatus"]["in progress"], 1);
    assert_eq!(json["todosByStatus"]["done"], 1);
    assert_eq!(json["todosByPriority"]["high"], 1);
    assert_eq!(json["todosByLabel"]["feature"], 3);
}

#[tokio::test]
async fn test_dashboard_stats_empty_store() {
    let app = create_routes(state_over(&InMemoryTaskStore::new()));
    let (status, json) = send(app, Method::GET, "/api/dashboard/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalTodos"], 0);
    assert_eq!(json["completionRate"], 0.0);
    assert_eq!(json["todosByStatus"], json!({}));
}

#[tokio::test]
async fn test_dashboard_activity() {
    let store = InMemoryTaskStore::with_tasks(tasks_with(2, |id, b| match id {
        1 => b.created_at(days_ago(fixed_now(), 5)),
        _ => b,
    }));
    let app = create_routes(state_over(&store));
    let (status, json) = send(app, Method::GET, "/api/dashboard/activity", None).await;

    assert_eq!(status, StatusCode::OK);
    let days = json.as_array().unwrap();
    assert_eq!(days.len(), 30);
    assert_eq!(days[0]["date"], "2024-05-17");
    assert_eq!(days[29]["date"], "2024-06-15");
    assert_eq!(days[29]["created"], 1);
    assert_eq!(days[29]["total"], 1);
    assert_eq!(days[24]["created"], 1);
    assert_eq!(days[24]["inProgress"], 0);
}

#[tokio::test]
async fn test_dashboard_store_failure() {
    let app = create_routes(failing_state(FailurePoint::Count));
    let (status, json) = send(app, Method::GET, "/api/dashboard/stats", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["type"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_bulk_update() {
    let store = seeded_store();
    let app = create_routes(state_over(&store));
    let (status, json) = send(
        app,
        Method::PATCH,
        "/api/todo/bulk",
        Some(json!({"ids": [3, 2, 3], "updates": {"status": "done", "priority": "low"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true, "updatedCount": 2}));
    assert_eq!(store.get(2).unwrap().status, TaskStatus::Done);
    assert_eq!(store.get(3).unwrap().priority, Priority::Low);
    assert_eq!(store.get(1).unwrap().priority, Priority::Medium);
}

#[tokio::test]
async fn test_bulk_update_rejects_empty_ids_without_touching_store() {
    let store = seeded_store();
    let app = create_routes(state_over(&store));
    let (status, json) = send(
        app,
        Method::PATCH,
        "/api/todo/bulk",
        Some(json!({"ids": [], "updates": {"status": "done"}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "INVALID_ARGUMENT");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_bulk_update_rejects_empty_patch() {
    let store = seeded_store();
    let app = create_routes(state_over(&store));
    let (status, _) = send(
        app,
        Method::PATCH,
        "/api/todo/bulk",
        Some(json!({"ids": [1], "updates": {}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_bulk_update_unknown_literal_is_rejected() {
    let store = seeded_store();
    let (status, body) = send(
        create_routes(state_over(&store)),
        Method::PATCH,
        "/api/todo/bulk",
        Some(json!({"ids": [1], "updates": {"status": "in_progress"}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.as_str().unwrap().contains("in_progress"));
    assert_eq!(store.call_count(), 0);
    assert_eq!(store.get(1).unwrap().status, TaskStatus::Done);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let store = seeded_store();
    let response = create_routes(state_over(&store))
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/todo/bulk")
                .header("content-type", "application/json")
                .body(Body::from("{\"ids\": [1,"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_bulk_delete() {
    let store = seeded_store();
    let app = create_routes(state_over(&store));
    let (status, json) = send(
        app,
        Method::DELETE,
        "/api/todo/bulk",
        Some(json!({"ids": [1, 2, 99]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true, "deletedCount": 2}));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_bulk_delete_nothing_matched() {
    let store = seeded_store();
    let app = create_routes(state_over(&store));
    let (status, json) = send(
        app,
        Method::DELETE,
        "/api/todo/bulk",
        Some(json!({"ids": [41, 42]})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["type"], "NOT_FOUND");
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_bulk_delete_store_failure() {
    let app = create_routes(failing_state(FailurePoint::Mutations));
    let (status, json) = send(
        app,
        Method::DELETE,
        "/api/todo/bulk",
        Some(json!({"ids": [1]})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["type"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_create_and_list_todos() {
    let store = InMemoryTaskStore::new();
    let (status, created) = send(
        create_routes(state_over(&store)),
        Method::POST,
        "/api/todo",
        Some(json!({"text": "  准备发布说明  ", "priority": "high"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["text"], "准备发布说明");
    assert_eq!(created["status"], "todo");
    assert_eq!(created["priority"], "high");

    let (status, list) = send(create_routes(state_over(&store)), Method::GET, "/api/todo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_create_todo_blank_text() {
    let store = InMemoryTaskStore::new();
    let (status, json) = send(
        create_routes(state_over(&store)),
        Method::POST,
        "/api/todo",
        Some(json!({"text": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], 400);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_toggle_todo() {
    let store = seeded_store();
    let (status, json) = send(
        create_routes(state_over(&store)),
        Method::PATCH,
        "/api/todo/toggle",
        Some(json!({"id": 2, "completed": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));
    let task = store.get(2).unwrap();
    assert!(task.completed);
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_update_todo() {
    let store = seeded_store();
    let (status, json) = send(
        create_routes(state_over(&store)),
        Method::PATCH,
        "/api/todo/3",
        Some(json!({
            "text": "修复登录页",
            "label": "bug",
            "status": "in progress",
            "priority": "medium"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 3);
    assert_eq!(json["label"], "bug");
    assert_eq!(json["status"], "in progress");
    assert_eq!(store.get(3).unwrap().text, "修复登录页");
}

#[tokio::test]
async fn test_update_missing_todo() {
    let (status, json) = send(
        create_routes(state_over(&seeded_store())),
        Method::PATCH,
        "/api/todo/77",
        Some(json!({
            "text": "不存在",
            "label": "bug",
            "status": "todo",
            "priority": "low"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], 404);
}

#[tokio::test]
async fn test_delete_todo() {
    let store = seeded_store();
    let (status, _) = send(create_routes(state_over(&store)), Method::DELETE, "/api/todo/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.get(1).is_none());

    let (status, _) = send(create_routes(state_over(&store)), Method::DELETE, "/api/todo/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let mut state = state_over(&InMemoryTaskStore::new());
    state.metrics = Some(MetricsRoute {
        path: "/metrics".to_string(),
        handle: PrometheusBuilder::new().build_recorder().handle(),
    });

    let response = create_routes(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; version=0.0.4"
    );
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = create_routes(state_over(&InMemoryTaskStore::new()));
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_app_with_layers() {
    let app = create_app(state_over(&seeded_store()), &ApiConfig::default());
    let (status, json) = send(app, Method::GET, "/api/dashboard/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalTodos"], 3);
}
