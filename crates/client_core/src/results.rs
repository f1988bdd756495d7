//! Display summary of a scored submission.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use shared::protocol::ResultPayload;

pub const DOMAIN_ORDER: [&str; 4] = [
    "Reaction Speed",
    "Vehicle Control",
    "Spatial Awareness",
    "Road Behavior",
];
const DEFAULT_CATEGORY: &str = "Medium";
const DEFAULT_CATEGORY_LABEL: &str = "Average";
const COURSE_PENDING: &str = "Course recommendation pending";
const ANALYSIS_PENDING: &str = "Analysis pending";

#[derive(Debug, Clone, PartialEq)]
pub struct DomainSummary {
    pub domain: &'static str,
    pub score: f64,
    pub category: String,
    pub category_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub full_name: String,
    pub domains: Vec<DomainSummary>,
    pub overall_score: f64,
    pub top_strength: DomainSummary,
    pub area_to_improve: DomainSummary,
    pub driving_style: String,
    pub driving_style_headline: String,
    pub recommended_course: String,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl ResultSummary {
    pub fn from_payload(payload: &ResultPayload) -> Self {
        let domains: Vec<DomainSummary> = DOMAIN_ORDER
            .iter()
            .map(|&domain| match payload.scores.get(domain) {
                Some(score) => DomainSummary {
                    domain,
                    score: score.score,
                    category: score.category.clone(),
                    category_label: score.category_label.clone(),
                },
                None => DomainSummary {
                    domain,
                    score: 0.0,
                    category: DEFAULT_CATEGORY.to_string(),
                    category_label: DEFAULT_CATEGORY_LABEL.to_string(),
                },
            })
            .collect();

        let overall_score =
            domains.iter().map(|domain| domain.score).sum::<f64>() / domains.len() as f64;

        // Stable sort keeps the fixed domain order among equal scores.
        let mut ranked = domains.clone();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        let top_strength = ranked[0].clone();
        let area_to_improve = ranked[ranked.len() - 1].clone();

        let driving_style = payload.llm_analysis.driving_style.clone();
        let driving_style_headline = driving_style
            .split('.')
            .next()
            .map(str::trim)
            .filter(|headline| !headline.is_empty())
            .unwrap_or(ANALYSIS_PENDING)
            .to_string();

        let recommended_course = payload
            .llm_analysis
            .recommended_course
            .as_ref()
            .and_then(|course| course.display_text())
            .unwrap_or_else(|| COURSE_PENDING.to_string());

        Self {
            full_name: payload.user.full_name.clone(),
            domains,
            overall_score,
            top_strength,
            area_to_improve,
            driving_style,
            driving_style_headline,
            recommended_course,
            completed_at: parse_completed_at(&payload.completed_at),
        }
    }
}

/// Accepts RFC 3339 and the offset-less ISO form the scoring service emits (read as UTC).
pub fn parse_completed_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

pub fn format_completed_at(completed_at: Option<DateTime<FixedOffset>>) -> String {
    match completed_at {
        Some(at) => at.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "unknown".to_string(),
    }
}
