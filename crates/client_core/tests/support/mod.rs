//! In-process stand-in for the scoring backend.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{
    domain::{Question, QuestionId, RespondentProfile},
    protocol::{DomainScore, SaveProgressRequest, SubmitRequest},
};
use tokio::{net::TcpListener, sync::Mutex};

pub const SECTIONS: [(&str, &str, i64); 4] = [
    ("RS", "Reaction Speed", 1),
    ("VC", "Vehicle Control", 2),
    ("SA", "Spatial Awareness", 3),
    ("RB", "Road Behavior", 4),
];
pub const QUESTIONS_PER_SECTION: usize = 5;

pub struct BackendState {
    session_id: String,
    pub questions: Vec<Question>,
    pub profiles: Mutex<HashMap<String, RespondentProfile>>,
    pub saved: Mutex<HashMap<String, SaveProgressRequest>>,
    pub submissions: Mutex<Vec<SubmitRequest>>,
    pub questionnaire_fetches: AtomicUsize,
}

impl BackendState {
    pub fn fetches(&self) -> usize {
        self.questionnaire_fetches.load(Ordering::SeqCst)
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

/// Twenty statements, five per domain, interleaved the way the service shuffles them.
pub fn question_set() -> Vec<Question> {
    (1..=QUESTIONS_PER_SECTION)
        .flat_map(|n| {
            SECTIONS.iter().map(move |(prefix, section, section_id)| Question {
                id: QuestionId::new(format!("{prefix}{n}")),
                text: format!("{section} statement {n}"),
                reverse: false,
                section: section.to_string(),
                section_id: *section_id,
            })
        })
        .collect()
}

pub async fn spawn_backend(session_id: &str) -> FakeBackend {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let state = Arc::new(BackendState {
        session_id: session_id.to_string(),
        questions: question_set(),
        profiles: Mutex::new(HashMap::new()),
        saved: Mutex::new(HashMap::new()),
        submissions: Mutex::new(Vec::new()),
        questionnaire_fetches: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(register))
        .route("/api/questionnaire", get(questionnaire))
        .route("/api/save-progress", post(save_progress))
        .route("/api/load-progress/:session_id", get(load_progress))
        .route("/api/submit", post(submit))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FakeBackend {
        base_url: format!("http://{addr}"),
        state,
    }
}

type Reply = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> Reply {
    (status, Json(json!({ "error": message.into() })))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "timestamp": "2024-05-01T10:00:00"}))
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(profile): Json<RespondentProfile>,
) -> Reply {
    if profile.email.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Missing required field: email");
    }
    state
        .profiles
        .lock()
        .await
        .insert(state.session_id.clone(), profile);
    (
        StatusCode::CREATED,
        Json(json!({"session_id": state.session_id, "message": "Registration successful"})),
    )
}

#[derive(Deserialize)]
struct QuestionnaireQuery {
    session_id: Option<String>,
}

async fn questionnaire(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<QuestionnaireQuery>,
) -> Reply {
    state.questionnaire_fetches.fetch_add(1, Ordering::SeqCst);
    if let Some(session_id) = query.session_id {
        if !state.profiles.lock().await.contains_key(&session_id) {
            return error(StatusCode::NOT_FOUND, "Session not found");
        }
    }
    (
        StatusCode::OK,
        Json(json!({
            "questions": state.questions,
            "answers": [
                {"value": 1, "label": "Strongly Disagree"},
                {"value": 2, "label": "Disagree"},
                {"value": 3, "label": "Agree"},
                {"value": 4, "label": "Strongly Agree"}
            ],
            "total_questions": state.questions.len()
        })),
    )
}

async fn save_progress(
    State(state): State<Arc<BackendState>>,
    Json(request): Json<SaveProgressRequest>,
) -> Reply {
    if !state
        .profiles
        .lock()
        .await
        .contains_key(request.session_id.as_str())
    {
        return error(StatusCode::NOT_FOUND, "Session not found");
    }
    state
        .saved
        .lock()
        .await
        .insert(request.session_id.0.clone(), request);
    (
        StatusCode::OK,
        Json(json!({"message": "Progress saved successfully", "saved_at": "2024-05-01T10:00:00"})),
    )
}

async fn load_progress(
    State(state): State<Arc<BackendState>>,
    Path(session_id): Path<String>,
) -> Reply {
    let Some(profile) = state.profiles.lock().await.get(&session_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Session not found");
    };
    let saved = state.saved.lock().await.get(&session_id).cloned();
    let (answers, index) = saved
        .map(|saved| (saved.answers, saved.current_question_index))
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "user": profile,
            "answers": answers,
            "current_question_index": index,
            "last_saved": "2024-05-01T10:00:00"
        })),
    )
}

fn categorize(score: f64) -> (&'static str, &'static str) {
    if score >= 3.5 {
        ("High", "Strong")
    } else if score >= 2.5 {
        ("Medium", "Average")
    } else {
        ("Low", "Developing")
    }
}

async fn submit(
    State(state): State<Arc<BackendState>>,
    Json(request): Json<SubmitRequest>,
) -> Reply {
    let Some(profile) = state
        .profiles
        .lock()
        .await
        .get(request.session_id.as_str())
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Session not found");
    };
    if request.answers.len() < state.questions.len() {
        return error(
            StatusCode::BAD_REQUEST,
            format!(
                "Only {} of {} questions answered",
                request.answers.len(),
                state.questions.len()
            ),
        );
    }

    let mut scores = BTreeMap::new();
    for (_, section, _) in SECTIONS {
        let values: Vec<f64> = state
            .questions
            .iter()
            .filter(|question| question.section == section)
            .filter_map(|question| request.answers.get(&question.id))
            .map(|value| f64::from(value.value()))
            .collect();
        let score = values.iter().sum::<f64>() / values.len() as f64;
        let (category, category_label) = categorize(score);
        scores.insert(
            section.to_string(),
            DomainScore {
                score,
                category: category.to_string(),
                category_label: category_label.to_string(),
                domain_key: section.to_lowercase().replace(' ', "_"),
            },
        );
    }
    state.submissions.lock().await.push(request);

    (
        StatusCode::OK,
        Json(json!({
            "user": profile,
            "scores": scores,
            "llm_analysis": {
                "driving_style": "Steady and consistent. Rarely takes risks.",
                "recommended_course": {"course_name": "Defensive Driving", "description": "Anticipate hazards earlier"}
            },
            "completed_at": "2024-05-01T10:15:30.123456"
        })),
    )
}
