use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerMap, Question, QuestionId, RespondentProfile, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub value: u8,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireResponse {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<AnswerOption>,
    #[serde(default)]
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveProgressRequest {
    pub session_id: SessionId,
    pub answers: AnswerMap,
    pub current_question_index: usize,
}

/// Progress previously saved on the server. Answers are kept as raw integers so a
/// single bad entry does not reject the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProgressResponse {
    pub user: RespondentProfile,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, i64>,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub answers: AnswerMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub score: f64,
    pub category: String,
    pub category_label: String,
    #[serde(default)]
    pub domain_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendedCourse {
    Text(String),
    Structured {
        #[serde(default)]
        course_name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl RecommendedCourse {
    /// Display text: `"<name>: <description>"`, or whichever part is present.
    pub fn display_text(&self) -> Option<String> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|text| !text.is_empty())
        }

        match self {
            RecommendedCourse::Text(text) if text.is_empty() => None,
            RecommendedCourse::Text(text) => Some(text.clone()),
            RecommendedCourse::Structured {
                course_name,
                description,
            } => match (present(course_name), present(description)) {
                (Some(name), Some(description)) => Some(format!("{name}: {description}")),
                (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
                (None, None) => None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAnalysis {
    #[serde(default)]
    pub driving_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_course: Option<RecommendedCourse>,
}

/// Scored submission result handed from the questionnaire to the results view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub user: RespondentProfile,
    pub scores: BTreeMap<String, DomainScore>,
    pub llm_analysis: LlmAnalysis,
    #[serde(default)]
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}
