use shared::{
    domain::{AnswerMap, LikertValue, Question, QuestionId},
    protocol::AnswerOption,
};

use crate::controller::SessionPhase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub section: String,
    /// 1-based position within the set.
    pub position: usize,
    pub selected: Option<LikertValue>,
}

/// Everything a front-end needs to render the questionnaire screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub question: Option<QuestionView>,
    pub options: Vec<AnswerOption>,
    pub answered: usize,
    pub total: usize,
    pub remaining: usize,
    pub progress_percent: u8,
    pub is_first: bool,
    pub is_last: bool,
    /// Forward navigation is offered once the current question has an answer.
    pub can_go_next: bool,
    /// A save, submit or restore is in flight.
    pub busy: bool,
}

impl SessionView {
    pub(crate) fn build(
        phase: SessionPhase,
        questions: &[Question],
        options: &[AnswerOption],
        answers: &AnswerMap,
        current_index: usize,
        busy: bool,
    ) -> Self {
        let total = questions.len();
        let answered = questions
            .iter()
            .filter(|question| answers.contains_key(&question.id))
            .count();
        let question = questions.get(current_index).map(|question| QuestionView {
            id: question.id.clone(),
            text: question.text.clone(),
            section: question.section.clone(),
            position: current_index + 1,
            selected: answers.get(&question.id).copied(),
        });
        let progress_percent = if total == 0 {
            0
        } else {
            (((current_index + 1).min(total) as f64 / total as f64) * 100.0).round() as u8
        };
        let options = if options.is_empty() {
            default_options()
        } else {
            options.to_vec()
        };

        Self {
            phase,
            can_go_next: question
                .as_ref()
                .is_some_and(|question| question.selected.is_some()),
            question,
            options,
            answered,
            total,
            remaining: total - answered,
            progress_percent,
            is_first: current_index == 0,
            is_last: total > 0 && current_index + 1 >= total,
            busy,
        }
    }
}

/// The four canonical Likert labels, used when the service sent none.
pub fn default_options() -> Vec<AnswerOption> {
    LikertValue::ALL
        .iter()
        .map(|value| AnswerOption {
            value: value.value(),
            label: value.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|n| Question {
                id: QuestionId::new(format!("Q{n}")),
                text: format!("Question {n}"),
                reverse: false,
                section: "Reaction Speed".into(),
                section_id: 1,
            })
            .collect()
    }

    #[test]
    fn view_reports_position_and_progress() {
        let questions = questions(3);
        let mut answers = AnswerMap::new();
        answers.insert(QuestionId::from("Q1"), LikertValue::Agree);

        let view = SessionView::build(SessionPhase::Ready, &questions, &[], &answers, 1, false);

        let question = view.question.expect("current question");
        assert_eq!(question.position, 2);
        assert_eq!(question.selected, Some(LikertValue::Agree));
        assert_eq!(view.progress_percent, 67);
        assert_eq!((view.answered, view.remaining, view.total), (1, 2, 3));
        assert!(view.can_go_next);
        assert!(!view.is_first);
        assert!(!view.is_last);
        assert_eq!(view.options.len(), 4);
        assert_eq!(view.options[0].label, "Strongly Disagree");
    }

    #[test]
    fn unanswered_last_question_blocks_forward() {
        let questions = questions(2);
        let view = SessionView::build(
            SessionPhase::Ready,
            &questions,
            &[AnswerOption {
                value: 1,
                label: "Never".into(),
            }],
            &AnswerMap::new(),
            1,
            true,
        );

        assert!(view.is_last);
        assert!(!view.can_go_next);
        assert!(view.busy);
        assert_eq!(view.progress_percent, 100);
        assert_eq!(view.options.len(), 1);
    }

    #[test]
    fn empty_set_has_no_current_question() {
        let view = SessionView::build(
            SessionPhase::Uninitialized,
            &[],
            &[],
            &AnswerMap::new(),
            0,
            false,
        );
        assert_eq!(view.question, None);
        assert_eq!(view.progress_percent, 0);
        assert!(!view.is_last);
    }
}
