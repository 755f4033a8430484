//! `HttpRemote` against an in-process axum server standing in for the
//! question-answering service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use colloquy_core::types::{Message, SessionId};
use colloquy_remote::{AskRequest, HttpRemote, RemoteError, RemoteStore};

// =============================================================================
// Helpers
// =============================================================================

/// Requests seen by the mock server, as `(route, id, body)`.
type Recorded = Arc<Mutex<Vec<(String, String, Value)>>>;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn mock_service(recorded: Recorded) -> Router {
    Router::new()
        .route(
            "/sessions",
            get(|| async {
                Json(json!([
                    {"id": "s1", "name": "Physics", "is_deleted": false},
                    {"id": 2, "name": "Old", "is_deleted": true},
                ]))
            }),
        )
        .route(
            "/create-session",
            post(|| async { Json(json!({"id": "new-1"})) }),
        )
        .route(
            "/session/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "empty" {
                    Json(json!({}))
                } else {
                    Json(json!({"messages": [
                        {"role": "user", "text": "hi"},
                        {"role": "bot", "text": "hello"},
                    ]}))
                }
            }),
        )
        .route(
            "/delete-session/{id}",
            put(
                |State(rec): State<Recorded>, Path(id): Path<String>| async move {
                    rec.lock().unwrap().push(("delete".into(), id, Value::Null));
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/rename-session/{id}",
            put(
                |State(rec): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    rec.lock().unwrap().push(("rename".into(), id, body));
                    Json(json!({"status": "ok"}))
                },
            ),
        )
        .route(
            "/ask",
            post(|State(rec): State<Recorded>, Json(body): Json<Value>| async move {
                rec.lock()
                    .unwrap()
                    .push(("ask".into(), String::new(), body.clone()));
                Json(json!({"answer": format!("echo: {}", body["query"].as_str().unwrap_or(""))}))
            }),
        )
        .with_state(recorded)
}

fn client(base: &str) -> HttpRemote {
    HttpRemote::new(base, Duration::from_secs(5)).unwrap()
}

// =============================================================================
// Happy paths
// =============================================================================

#[tokio::test]
async fn test_list_sessions_returns_raw_listing() {
    let base = spawn(mock_service(Recorded::default())).await;
    let sessions = client(&base).list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, SessionId::from("s1"));
    assert_eq!(sessions[0].name, "Physics");
    assert!(!sessions[0].is_deleted);
    assert_eq!(sessions[1].id.as_str(), "2");
    assert!(sessions[1].is_deleted);
}

#[tokio::test]
async fn test_create_session_returns_id() {
    let base = spawn(mock_service(Recorded::default())).await;
    let id = client(&base).create_session().await.unwrap();
    assert_eq!(id, SessionId::from("new-1"));
}

#[tokio::test]
async fn test_session_messages() {
    let base = spawn(mock_service(Recorded::default())).await;
    let remote = client(&base);

    let messages = remote
        .session_messages(&SessionId::from("s1"))
        .await
        .unwrap();
    assert_eq!(
        messages,
        vec![Message::user("hi"), Message::bot("hello", false)]
    );

    let empty = remote
        .session_messages(&SessionId::from("empty"))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_delete_and_rename_hit_the_right_routes() {
    let recorded = Recorded::default();
    let base = spawn(mock_service(recorded.clone())).await;
    let remote = client(&base);

    remote.delete_session(&SessionId::from("s1")).await.unwrap();
    remote
        .rename_session(&SessionId::from("s1"), "Chemistry")
        .await
        .unwrap();

    let seen = recorded.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "delete");
    assert_eq!(seen[0].1, "s1");
    assert_eq!(seen[1].0, "rename");
    assert_eq!(seen[1].2, json!({"new_name": "Chemistry"}));
}

#[tokio::test]
async fn test_ask_sends_query_session_and_language() {
    let recorded = Recorded::default();
    let base = spawn(mock_service(recorded.clone())).await;

    let answer = client(&base)
        .ask(&AskRequest {
            query: "What is a photon?".to_string(),
            session_id: SessionId::from("s1"),
            selected_lang: "gu".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(answer, "echo: What is a photon?");

    let seen = recorded.lock().unwrap().clone();
    assert_eq!(
        seen[0].2,
        json!({"query": "What is a photon?", "session_id": "s1", "selected_lang": "gu"})
    );
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/sessions",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn(router).await;

    let err = client(&base).list_sessions().await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Status {
            endpoint: "/sessions",
            status: 500
        }
    ));
}

#[tokio::test]
async fn test_missing_route_is_a_status_error() {
    let base = spawn(Router::new()).await;
    let err = client(&base).create_session().await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_a_decode_error() {
    let router = Router::new().route("/create-session", post(|| async { "not json" }));
    let base = spawn(router).await;

    let err = client(&base).create_session().await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Decode {
            endpoint: "/create-session",
            ..
        }
    ));
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .list_sessions()
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_answer_times_out() {
    let router = Router::new().route(
        "/ask",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"answer": "too late"}))
        }),
    );
    let base = spawn(router).await;
    let remote = HttpRemote::new(&base, Duration::from_millis(200)).unwrap();

    let err = remote
        .ask(&AskRequest {
            query: "q".to_string(),
            session_id: SessionId::from("s1"),
            selected_lang: "en".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}
