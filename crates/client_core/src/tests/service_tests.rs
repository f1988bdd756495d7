use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{AnswerMap, LikertValue, QuestionId},
    protocol::RecommendedCourse,
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    paths: Arc<Mutex<Vec<String>>>,
}

async fn spawn_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn client(base_url: &str) -> HttpSessionService {
    HttpSessionService::new(base_url, Duration::from_secs(5)).expect("client")
}

fn profile() -> RespondentProfile {
    RespondentProfile {
        full_name: "Dana Lee".into(),
        email: "dana@example.com".into(),
        gender: "Female".into(),
        age_group: "26-35".into(),
    }
}

async fn handle_register(
    State(recorded): State<Recorded>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    recorded.bodies.lock().await.push(body);
    (
        StatusCode::CREATED,
        Json(json!({"session_id": "abc123", "message": "Registration successful"})),
    )
}

#[tokio::test]
async fn register_posts_profile_and_returns_session_id() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/register", post(handle_register))
        .with_state(recorded.clone());
    let base_url = spawn_server(app).await.expect("spawn server");

    let response = client(&base_url)
        .register(&profile())
        .await
        .expect("register");

    assert_eq!(response.session_id, SessionId::from("abc123"));
    let bodies = recorded.bodies.lock().await;
    assert_eq!(bodies[0]["email"], "dana@example.com");
    assert_eq!(bodies[0]["age_group"], "26-35");
}

#[tokio::test]
async fn rejection_carries_body_error_message() {
    let app = Router::new().route(
        "/api/register",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Missing required field: email"})),
            )
        }),
    );
    let base_url = spawn_server(app).await.expect("spawn server");

    let err = client(&base_url)
        .register(&profile())
        .await
        .expect_err("must fail");

    assert_eq!(
        err,
        ServiceError::Rejected {
            operation: ServiceOperation::Register,
            status: 400,
            message: "Missing required field: email".into(),
        }
    );
}

#[tokio::test]
async fn rejection_without_error_body_uses_fallback_message() {
    let app = Router::new().route(
        "/api/submit",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let base_url = spawn_server(app).await.expect("spawn server");

    let err = client(&base_url)
        .submit(&SubmitRequest {
            session_id: SessionId::from("abc123"),
            answers: AnswerMap::new(),
        })
        .await
        .expect_err("must fail");

    assert_eq!(err.to_string(), "Failed to submit questionnaire");
}

async fn handle_questionnaire(
    State(recorded): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.queries.lock().await.push(query);
    Json(json!({
        "questions": [
            {"id": "VC2", "text": "I stay centred in my lane.", "reverse": false, "section": "Vehicle Control", "section_id": 2},
            {"id": "RS1", "text": "I brake quickly.", "reverse": true, "section": "Reaction Speed", "section_id": 1}
        ],
        "answers": [
            {"value": 1, "label": "Strongly Disagree"},
            {"value": 4, "label": "Strongly Agree"}
        ],
        "total_questions": 2
    }))
}

#[tokio::test]
async fn fetch_questionnaire_passes_session_id_and_keeps_order() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/questionnaire", get(handle_questionnaire))
        .with_state(recorded.clone());
    let base_url = spawn_server(app).await.expect("spawn server");
    let service = client(&base_url);

    let with_session = service
        .fetch_questionnaire(Some(&SessionId::from("abc123")))
        .await
        .expect("fetch");
    service.fetch_questionnaire(None).await.expect("fetch");

    let ids: Vec<_> = with_session
        .questions
        .iter()
        .map(|q| q.id.as_str())
        .collect();
    assert_eq!(ids, vec!["VC2", "RS1"]);
    assert!(with_session.questions[1].reverse);
    assert_eq!(with_session.total_questions, 2);

    let queries = recorded.queries.lock().await;
    assert_eq!(queries[0].get("session_id").map(String::as_str), Some("abc123"));
    assert!(queries[1].is_empty());
}

#[tokio::test]
async fn fetch_questionnaire_failure_uses_generic_message() {
    let app = Router::new().route(
        "/api/questionnaire",
        get(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "internal detail"})),
            )
        }),
    );
    let base_url = spawn_server(app).await.expect("spawn server");

    let err = client(&base_url)
        .fetch_questionnaire(None)
        .await
        .expect_err("must fail");
    assert_eq!(err.to_string(), "Failed to fetch questionnaire");
}

async fn handle_save(
    State(recorded): State<Recorded>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.bodies.lock().await.push(body);
    Json(json!({"message": "Progress saved successfully", "saved_at": "2024-05-01T10:00:00"}))
}

#[tokio::test]
async fn save_progress_posts_snapshot() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/save-progress", post(handle_save))
        .with_state(recorded.clone());
    let base_url = spawn_server(app).await.expect("spawn server");

    let mut answers = AnswerMap::new();
    answers.insert(QuestionId::from("RS1"), LikertValue::Agree);
    client(&base_url)
        .save_progress(&SaveProgressRequest {
            session_id: SessionId::from("abc123"),
            answers,
            current_question_index: 5,
        })
        .await
        .expect("save");

    let bodies = recorded.bodies.lock().await;
    assert_eq!(
        bodies[0],
        json!({"session_id": "abc123", "answers": {"RS1": 3}, "current_question_index": 5})
    );
}

async fn handle_load_progress(
    State(recorded): State<Recorded>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    recorded.paths.lock().await.push(session_id);
    Json(json!({
        "user": {"full_name": "Dana Lee", "email": "dana@example.com", "gender": "Female", "age_group": "26-35"},
        "answers": {"RS1": 2},
        "current_question_index": 1,
        "last_saved": "2024-05-01T10:00:00"
    }))
}

#[tokio::test]
async fn load_progress_escapes_session_id_path_segment() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/load-progress/:session_id", get(handle_load_progress))
        .with_state(recorded.clone());
    let base_url = spawn_server(app).await.expect("spawn server");

    let progress = client(&base_url)
        .load_progress(&SessionId::from("odd id/1"))
        .await
        .expect("load");

    assert_eq!(progress.current_question_index, 1);
    assert_eq!(progress.answers.get("RS1"), Some(&2));
    assert_eq!(recorded.paths.lock().await[0], "odd id/1");
}

#[tokio::test]
async fn submit_decodes_structured_course_recommendation() {
    let app = Router::new().route(
        "/api/submit",
        post(|| async {
            Json(json!({
                "user": {"full_name": "Dana Lee", "email": "dana@example.com", "gender": "Female", "age_group": "26-35"},
                "scores": {
                    "Reaction Speed": {"score": 3.0, "category": "Medium", "category_label": "Average", "domain_key": "reaction_speed"}
                },
                "llm_analysis": {
                    "driving_style": "Balanced",
                    "recommended_course": {"course_name": "Hazard Awareness", "description": "Spot risks earlier"}
                },
                "completed_at": "2024-05-01T10:00:00.123456"
            }))
        }),
    );
    let base_url = spawn_server(app).await.expect("spawn server");

    let payload = client(&base_url)
        .submit(&SubmitRequest {
            session_id: SessionId::from("abc123"),
            answers: AnswerMap::new(),
        })
        .await
        .expect("submit");

    assert_eq!(payload.scores["Reaction Speed"].score, 3.0);
    assert_eq!(payload.scores["Reaction Speed"].category, "Medium");
    assert_eq!(
        payload.llm_analysis.recommended_course,
        Some(RecommendedCourse::Structured {
            course_name: Some("Hazard Awareness".into()),
            description: Some("Spot risks earlier".into()),
        })
    );
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let app = Router::new().route("/api/health", get(|| async { "healthy" }));
    let base_url = spawn_server(app).await.expect("spawn server");

    let err = client(&base_url)
        .health_check()
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ServiceError::Decode {
            operation: ServiceOperation::HealthCheck,
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .health_check()
        .await
        .expect_err("must fail");
    assert!(matches!(err, ServiceError::Transport { .. }));
    assert!(err.to_string().starts_with("Health check failed"));
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let service = client("http://localhost:5001/backend/");
    assert_eq!(
        service.endpoint(&["api", "load-progress", "a b"]).as_str(),
        "http://localhost:5001/backend/api/load-progress/a%20b"
    );
}
