use std::fmt::Write as _;

use client_core::{
    results::format_completed_at, ControllerEvent, ResultSummary, SessionPhase, SessionView,
};
use storage::CachedProgress;

pub const HELP: &str =
    "answer with 1-4 | b: back | n: next | s: save for later | r: restore saved | submit | q: quit";

pub const ANSWER_FIRST: &str = "Choose an answer before moving to the next question.";

pub fn question(view: &SessionView) -> String {
    let Some(question) = &view.question else {
        return format!("[{}] no question to show", view.phase);
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}  ({}%, {} answered)",
        question.position, view.total, view.progress_percent, view.answered
    );
    if !question.section.is_empty() {
        let _ = writeln!(out, "{}", question.section);
    }
    let _ = writeln!(out, "  {}", question.text);
    for option in &view.options {
        let marker = if question.selected.map(|value| value.value()) == Some(option.value) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, " {marker}{}. {}", option.value, option.label);
    }
    if view.busy {
        let _ = write!(out, "(request in progress) ");
    }
    let _ = write!(out, "{}", if view.is_last { "submit> " } else { "> " });
    out
}

/// Snackbar-style line for events worth showing to the respondent.
pub fn notice(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::ProgressSaved => Some("Progress saved.".into()),
        ControllerEvent::SaveFailed(message) => {
            Some(format!("{message}. Please try again."))
        }
        ControllerEvent::AnswersIncomplete { remaining } => Some(format!(
            "Please answer all questions. {remaining} question(s) remaining."
        )),
        ControllerEvent::ProgressRestored { answered } => {
            Some(format!("Restored {answered} saved answer(s)."))
        }
        ControllerEvent::RestoreFailed(message) => Some(format!("{message}.")),
        ControllerEvent::PhaseChanged(SessionPhase::Submitting) => {
            Some("Please wait while we load the results...".into())
        }
        ControllerEvent::PhaseChanged(_)
        | ControllerEvent::IndexChanged { .. }
        | ControllerEvent::AnswerRecorded { .. } => None,
    }
}

pub fn results(summary: &ResultSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nResults for {}", summary.full_name);
    let _ = writeln!(
        out,
        "Completed: {}",
        format_completed_at(summary.completed_at)
    );
    let _ = writeln!(out, "Driving style: {}", summary.driving_style_headline);
    let _ = writeln!(out, "Overall score: {:.2} / 4", summary.overall_score);
    for domain in &summary.domains {
        let _ = writeln!(
            out,
            "  {:<18} {:.1} / 4  {} ({})",
            domain.domain, domain.score, domain.category_label, domain.category
        );
    }
    let _ = writeln!(
        out,
        "Top strength: {} ({:.1})",
        summary.top_strength.domain, summary.top_strength.score
    );
    let _ = writeln!(
        out,
        "Area to improve: {} ({:.1})",
        summary.area_to_improve.domain, summary.area_to_improve.score
    );
    let _ = write!(out, "Recommended course: {}", summary.recommended_course);
    out
}

pub fn status(snapshot: &CachedProgress) -> String {
    let Some(session_id) = &snapshot.session_id else {
        return "no registered session".to_string();
    };
    match &snapshot.questions {
        Some(questions) => format!(
            "session {session_id}: {} of {} answered, at question {}",
            snapshot.answers.len(),
            questions.len(),
            snapshot.current_index + 1
        ),
        None => format!("session {session_id}: questionnaire not fetched yet"),
    }
}
