//! Questionnaire session controller.
//!
//! Owns session identity, answers and pagination for one respondent, merges the durable
//! cache with the remote service, and exposes a [`SessionView`] to the front-end.

use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{
    domain::{
        AnswerMap, LikertValue, LikertValueError, Question, QuestionId, RespondentProfile,
        SessionId,
    },
    error::ServiceError,
    protocol::{AnswerOption, SaveProgressRequest, SubmitRequest},
};
use storage::{ProgressStore, ResultsHolder};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{service::RemoteSessionService, view::SessionView};

pub const DEFAULT_AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(300);
const EVENT_CHANNEL_CAPACITY: usize = 64;
const CLEAR_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    Submitting,
    Completed,
    Errored(String),
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Uninitialized => f.write_str("uninitialized"),
            SessionPhase::Loading => f.write_str("loading"),
            SessionPhase::Ready => f.write_str("ready"),
            SessionPhase::Submitting => f.write_str("submitting"),
            SessionPhase::Completed => f.write_str("completed"),
            SessionPhase::Errored(message) => write!(f, "errored: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No session id is stored; the respondent must register first.
    RegistrationRequired,
    /// Restored from the durable cache without a network call.
    Hydrated,
    /// Question set fetched from the service and cached.
    Fetched,
    /// A newer bootstrap or registration started while this one was in flight.
    Superseded,
    /// A submission is still in flight; the session was left as it is.
    SubmitPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { index: usize },
    Submit(SubmitOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Ignored,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Incomplete { remaining: usize },
    Ignored,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { answered: usize, index: usize },
    Ignored,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    PhaseChanged(SessionPhase),
    IndexChanged { index: usize },
    AnswerRecorded {
        question_id: QuestionId,
        value: LikertValue,
    },
    ProgressSaved,
    SaveFailed(String),
    AnswersIncomplete { remaining: usize },
    ProgressRestored { answered: usize },
    RestoreFailed(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("questionnaire is not ready ({0})")]
    NotReady(SessionPhase),
    #[error(transparent)]
    InvalidAnswer(#[from] LikertValueError),
    #[error("unknown question id '{0}'")]
    UnknownQuestion(QuestionId),
    #[error("No questions available")]
    EmptyQuestionnaire,
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("progress store failure: {source:#}")]
    Store { source: anyhow::Error },
}

impl SessionError {
    fn store(source: anyhow::Error) -> Self {
        SessionError::Store { source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Save,
    Submit,
    Restore,
}

/// Guard for the one save, submit or restore call allowed per session at a time.
struct PendingRequest {
    kind: InFlight,
    session_id: SessionId,
    ticket: u64,
}

struct PendingAdvance {
    token: u64,
    task: JoinHandle<()>,
}

struct ControllerState {
    phase: SessionPhase,
    session_id: Option<SessionId>,
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
    answers: AnswerMap,
    current_index: usize,
    generation: u64,
    in_flight: Option<PendingRequest>,
    request_tickets: u64,
    auto_advance: Option<PendingAdvance>,
    advance_tokens: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            session_id: None,
            questions: Vec::new(),
            options: Vec::new(),
            answers: AnswerMap::new(),
            current_index: 0,
            generation: 0,
            in_flight: None,
            request_tickets: 0,
            auto_advance: None,
            advance_tokens: 0,
        }
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Ready {
            Ok(())
        } else {
            Err(SessionError::NotReady(self.phase.clone()))
        }
    }

    fn ready_session_id(&self) -> Result<SessionId, SessionError> {
        self.ensure_ready()?;
        self.session_id
            .clone()
            .ok_or_else(|| SessionError::NotReady(self.phase.clone()))
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(pending) = self.auto_advance.take() {
            pending.task.abort();
            debug!(token = pending.token, "pending auto-advance cancelled");
        }
    }

    fn begin_request(&mut self, kind: InFlight, session_id: &SessionId) -> u64 {
        self.request_tickets += 1;
        let ticket = self.request_tickets;
        self.in_flight = Some(PendingRequest {
            kind,
            session_id: session_id.clone(),
            ticket,
        });
        ticket
    }

    /// Clears the request guard if `ticket` still owns it.
    fn finish_request(&mut self, ticket: u64) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|request| request.ticket == ticket)
        {
            self.in_flight = None;
        }
    }

    /// Drops the request guard when it belongs to a session other than `session_id`.
    fn release_foreign_request(&mut self, session_id: Option<&SessionId>) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|request| Some(&request.session_id) != session_id)
        {
            if let Some(request) = self.in_flight.take() {
                debug!(
                    kind = ?request.kind,
                    session_id = %request.session_id,
                    "request guard released for replaced session"
                );
            }
        }
    }

    fn in_flight_kind(&self) -> Option<InFlight> {
        self.in_flight.as_ref().map(|request| request.kind)
    }

    /// Drops everything tied to the current attempt and invalidates in-flight responses.
    ///
    /// The request guard survives so a reloaded session cannot issue a second call while
    /// the first is still pending.
    fn reset_attempt(&mut self) {
        self.cancel_auto_advance();
        self.generation += 1;
        self.session_id = None;
        self.questions.clear();
        self.options.clear();
        self.answers.clear();
        self.current_index = 0;
    }

    fn unanswered(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| !self.answers.contains_key(&question.id))
            .count()
    }

    fn contains(&self, question_id: &QuestionId) -> bool {
        self.questions.iter().any(|question| &question.id == question_id)
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

pub struct SessionController {
    service: Arc<dyn RemoteSessionService>,
    store: ProgressStore,
    results: Arc<dyn ResultsHolder>,
    auto_advance_delay: Duration,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SessionController {
    pub fn new(
        service: Arc<dyn RemoteSessionService>,
        store: ProgressStore,
        results: Arc<dyn ResultsHolder>,
    ) -> Arc<Self> {
        Self::new_with_auto_advance_delay(service, store, results, DEFAULT_AUTO_ADVANCE_DELAY)
    }

    pub fn new_with_auto_advance_delay(
        service: Arc<dyn RemoteSessionService>,
        store: ProgressStore,
        results: Arc<dyn ResultsHolder>,
        auto_advance_delay: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            service,
            store,
            results,
            auto_advance_delay,
            state: Mutex::new(ControllerState::new()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn results(&self) -> &Arc<dyn ResultsHolder> {
        &self.results
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase.clone()
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.state.lock().await.session_id.clone()
    }

    pub async fn questions(&self) -> Vec<Question> {
        self.state.lock().await.questions.clone()
    }

    pub async fn answers(&self) -> AnswerMap {
        self.state.lock().await.answers.clone()
    }

    pub async fn current_index(&self) -> usize {
        self.state.lock().await.current_index
    }

    pub async fn view(&self) -> SessionView {
        let state = self.state.lock().await;
        SessionView::build(
            state.phase.clone(),
            &state.questions,
            &state.options,
            &state.answers,
            state.current_index,
            state.in_flight.is_some(),
        )
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    fn set_phase(&self, state: &mut ControllerState, phase: SessionPhase) {
        if state.phase != phase {
            debug!(from = %state.phase, to = %phase, "session phase changed");
            state.phase = phase.clone();
            self.emit(ControllerEvent::PhaseChanged(phase));
        }
    }

    /// Registers a respondent and makes the returned session the only durable attempt.
    ///
    /// The phase is left at `Uninitialized`; call [`bootstrap`](Self::bootstrap) next.
    pub async fn register(&self, profile: &RespondentProfile) -> Result<SessionId, SessionError> {
        let response = self.service.register(profile).await.map_err(|err| {
            warn!("registration failed: {err}");
            err
        })?;
        self.results.clear();

        let mut state = self.state.lock().await;
        state.reset_attempt();
        state.release_foreign_request(Some(&response.session_id));
        self.set_phase(&mut state, SessionPhase::Uninitialized);
        self.store
            .start_session(&response.session_id)
            .await
            .map_err(SessionError::store)?;
        info!(session_id = %response.session_id, "respondent registered");
        Ok(response.session_id)
    }

    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, SessionError> {
        let generation = {
            let mut state = self.state.lock().await;
            if state.in_flight_kind() == Some(InFlight::Submit) {
                debug!("bootstrap deferred while a submission is in flight");
                return Ok(BootstrapOutcome::SubmitPending);
            }
            state.reset_attempt();
            self.set_phase(&mut state, SessionPhase::Loading);
            state.generation
        };

        let session_id = match self.store.session_id().await {
            Ok(Some(session_id)) => session_id,
            Ok(None) => {
                let mut state = self.state.lock().await;
                if state.generation != generation {
                    return Ok(BootstrapOutcome::Superseded);
                }
                state.release_foreign_request(None);
                self.set_phase(&mut state, SessionPhase::Uninitialized);
                info!("no stored session, registration required");
                return Ok(BootstrapOutcome::RegistrationRequired);
            }
            Err(source) => {
                let mut state = self.state.lock().await;
                if state.generation != generation {
                    return Ok(BootstrapOutcome::Superseded);
                }
                self.set_phase(
                    &mut state,
                    SessionPhase::Errored(format!("Failed to read saved session: {source:#}")),
                );
                return Err(SessionError::store(source));
            }
        };

        match self.store.questions().await {
            Ok(Some(questions)) if !questions.is_empty() => {
                return self.hydrate(generation, session_id, questions).await;
            }
            Ok(_) => {}
            Err(err) => warn!("cached question set is unreadable, fetching again: {err:#}"),
        }

        self.fetch(generation, session_id).await
    }

    async fn hydrate(
        &self,
        generation: u64,
        session_id: SessionId,
        questions: Vec<Question>,
    ) -> Result<BootstrapOutcome, SessionError> {
        let mut answers = self.store.answers().await.unwrap_or_else(|err| {
            warn!("cached answers are unreadable, starting empty: {err:#}");
            AnswerMap::new()
        });
        let index = self.store.current_index().await.unwrap_or_else(|err| {
            warn!("cached question index is unreadable, starting at 0: {err:#}");
            0
        });

        let before = answers.len();
        answers.retain(|id, _| questions.iter().any(|question| &question.id == id));
        if answers.len() != before {
            warn!(
                dropped = before - answers.len(),
                "cached answers reference unknown questions"
            );
        }

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(generation, "discarding superseded cache hydration");
            return Ok(BootstrapOutcome::Superseded);
        }
        state.release_foreign_request(Some(&session_id));
        state.current_index = clamp_index(index, questions.len());
        state.session_id = Some(session_id);
        state.questions = questions;
        state.answers = answers;
        self.set_phase(&mut state, SessionPhase::Ready);
        info!(
            questions = state.questions.len(),
            answered = state.answers.len(),
            index = state.current_index,
            "questionnaire restored from cache"
        );
        Ok(BootstrapOutcome::Hydrated)
    }

    async fn fetch(
        &self,
        generation: u64,
        session_id: SessionId,
    ) -> Result<BootstrapOutcome, SessionError> {
        let result = self.service.fetch_questionnaire(Some(&session_id)).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(generation, "discarding stale questionnaire response");
            return Ok(BootstrapOutcome::Superseded);
        }
        state.release_foreign_request(Some(&session_id));

        let questionnaire = match result {
            Ok(questionnaire) => questionnaire,
            Err(err) => {
                warn!("questionnaire fetch failed: {err}");
                self.set_phase(&mut state, SessionPhase::Errored(err.to_string()));
                return Err(err.into());
            }
        };
        if questionnaire.questions.is_empty() {
            let err = SessionError::EmptyQuestionnaire;
            self.set_phase(&mut state, SessionPhase::Errored(err.to_string()));
            return Err(err);
        }

        if let Err(err) = self
            .store
            .begin_questionnaire(&questionnaire.questions)
            .await
        {
            warn!("failed to cache question set: {err:#}");
        }
        state.session_id = Some(session_id);
        state.questions = questionnaire.questions;
        state.options = questionnaire.answers;
        self.set_phase(&mut state, SessionPhase::Ready);
        info!(questions = state.questions.len(), "questionnaire fetched");
        Ok(BootstrapOutcome::Fetched)
    }

    /// Records an answer, persists it, and schedules the auto-advance when the answered
    /// question is the one on screen.
    pub async fn select_answer(
        self: &Arc<Self>,
        question_id: &QuestionId,
        value: i64,
    ) -> Result<(), SessionError> {
        let value = LikertValue::try_from(value)?;

        let mut state = self.state.lock().await;
        state.ensure_ready()?;
        let Some(position) = state
            .questions
            .iter()
            .position(|question| &question.id == question_id)
        else {
            error!(%question_id, "answer selected for a question outside the current set");
            return Err(SessionError::UnknownQuestion(question_id.clone()));
        };

        let previous = state.answers.insert(question_id.clone(), value);
        if let Err(source) = self.store.set_answers(&state.answers).await {
            match previous {
                Some(previous) => state.answers.insert(question_id.clone(), previous),
                None => state.answers.remove(question_id),
            };
            return Err(SessionError::store(source));
        }
        self.emit(ControllerEvent::AnswerRecorded {
            question_id: question_id.clone(),
            value,
        });

        state.cancel_auto_advance();
        if position == state.current_index && position + 1 < state.questions.len() {
            self.schedule_auto_advance(&mut state);
        }
        Ok(())
    }

    fn schedule_auto_advance(self: &Arc<Self>, state: &mut ControllerState) {
        state.advance_tokens += 1;
        let token = state.advance_tokens;
        let generation = state.generation;
        let from_index = state.current_index;
        let delay = self.auto_advance_delay;
        let controller: Weak<Self> = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller
                .apply_auto_advance(token, generation, from_index)
                .await;
        });
        state.auto_advance = Some(PendingAdvance { token, task });
    }

    async fn apply_auto_advance(&self, token: u64, generation: u64, from_index: usize) {
        let mut state = self.state.lock().await;
        let current = state.auto_advance.as_ref().map(|pending| pending.token);
        if current != Some(token)
            || state.generation != generation
            || state.phase != SessionPhase::Ready
            || state.current_index != from_index
        {
            debug!(token, "skipping outdated auto-advance");
            return;
        }
        // Dropping our own handle detaches it; aborting would cancel this task.
        state.auto_advance = None;

        let next = from_index + 1;
        if next >= state.questions.len() {
            return;
        }
        state.current_index = next;
        if let Err(err) = self.store.set_current_index(next).await {
            state.current_index = from_index;
            warn!("failed to persist auto-advanced index: {err:#}");
            return;
        }
        debug!(index = next, "auto-advanced to next question");
        self.emit(ControllerEvent::IndexChanged { index: next });
    }

    pub async fn cancel_auto_advance(&self) {
        self.state.lock().await.cancel_auto_advance();
    }

    pub async fn auto_advance_pending(&self) -> bool {
        self.state.lock().await.auto_advance.is_some()
    }

    async fn move_to(
        &self,
        state: &mut ControllerState,
        index: usize,
    ) -> Result<usize, SessionError> {
        let previous = state.current_index;
        if previous == index {
            return Ok(index);
        }
        state.current_index = index;
        if let Err(source) = self.store.set_current_index(index).await {
            state.current_index = previous;
            return Err(SessionError::store(source));
        }
        self.emit(ControllerEvent::IndexChanged { index });
        Ok(index)
    }

    pub async fn back(&self) -> Result<usize, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_ready()?;
        state.cancel_auto_advance();
        let index = state.current_index.saturating_sub(1);
        self.move_to(&mut state, index).await
    }

    /// Moves forward one question, or evaluates submission on the last one.
    pub async fn next(&self) -> Result<Navigation, SessionError> {
        {
            let mut state = self.state.lock().await;
            state.ensure_ready()?;
            state.cancel_auto_advance();
            if state.current_index + 1 < state.questions.len() {
                let index = state.current_index + 1;
                let index = self.move_to(&mut state, index).await?;
                return Ok(Navigation::Moved { index });
            }
        }
        Ok(Navigation::Submit(self.submit().await?))
    }

    /// Sends the current answers and index to the service for later resumption.
    pub async fn save_progress(&self) -> Result<SaveOutcome, SessionError> {
        let (generation, ticket, request) = {
            let mut state = self.state.lock().await;
            if let Some(in_flight) = state.in_flight_kind() {
                debug!(?in_flight, "save ignored while another request is in flight");
                return Ok(SaveOutcome::Ignored);
            }
            let session_id = state.ready_session_id()?;
            let ticket = state.begin_request(InFlight::Save, &session_id);
            let request = SaveProgressRequest {
                session_id,
                answers: state.answers.clone(),
                current_question_index: state.current_index,
            };
            (state.generation, ticket, request)
        };

        let result = self.service.save_progress(&request).await;

        let mut state = self.state.lock().await;
        state.finish_request(ticket);
        if state.generation != generation {
            debug!(generation, "discarding stale save response");
            return Ok(SaveOutcome::Discarded);
        }

        if let Err(err) = result {
            warn!("saving progress failed: {err}");
            self.emit(ControllerEvent::SaveFailed(err.to_string()));
            return Err(err.into());
        }
        if let Err(source) = self
            .store
            .save_progress(&state.answers, state.current_index)
            .await
        {
            warn!("progress saved remotely but not cached locally: {source:#}");
            return Err(SessionError::store(source));
        }
        info!(
            answered = state.answers.len(),
            index = state.current_index,
            "progress saved"
        );
        self.emit(ControllerEvent::ProgressSaved);
        Ok(SaveOutcome::Saved)
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        let (generation, ticket, request) = {
            let mut state = self.state.lock().await;
            if let Some(in_flight) = state.in_flight_kind() {
                debug!(?in_flight, "submit ignored while another request is in flight");
                return Ok(SubmitOutcome::Ignored);
            }
            let session_id = state.ready_session_id()?;
            state.cancel_auto_advance();

            let remaining = state.unanswered();
            if remaining > 0 {
                info!(remaining, "submission blocked by unanswered questions");
                self.emit(ControllerEvent::AnswersIncomplete { remaining });
                return Ok(SubmitOutcome::Incomplete { remaining });
            }

            let ticket = state.begin_request(InFlight::Submit, &session_id);
            self.set_phase(&mut state, SessionPhase::Submitting);
            let request = SubmitRequest {
                session_id,
                answers: state.answers.clone(),
            };
            (state.generation, ticket, request)
        };

        let result = self.service.submit(&request).await;

        let mut state = self.state.lock().await;
        state.finish_request(ticket);
        if state.generation != generation {
            debug!(generation, "discarding stale submit response");
            return Ok(SubmitOutcome::Discarded);
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                warn!("submission failed: {err}");
                self.set_phase(&mut state, SessionPhase::Errored(err.to_string()));
                return Err(err.into());
            }
        };

        self.results.set(payload);
        let cleared = self.clear_durable_session().await;
        state.reset_attempt();
        self.set_phase(&mut state, SessionPhase::Completed);
        info!("questionnaire submitted");
        cleared
            .map(|()| SubmitOutcome::Completed)
            .map_err(SessionError::store)
    }

    async fn clear_durable_session(&self) -> anyhow::Result<()> {
        let mut attempt = 1;
        loop {
            match self.store.clear().await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < CLEAR_ATTEMPTS => {
                    warn!(attempt, "failed to clear durable session, retrying: {err:#}");
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, "failed to clear durable session: {err:#}");
                    return Err(err);
                }
            }
        }
    }

    /// Replaces local answers and index with the copy last saved on the server.
    pub async fn restore_remote_progress(&self) -> Result<RestoreOutcome, SessionError> {
        let (generation, ticket, session_id) = {
            let mut state = self.state.lock().await;
            if let Some(in_flight) = state.in_flight_kind() {
                debug!(?in_flight, "restore ignored while another request is in flight");
                return Ok(RestoreOutcome::Ignored);
            }
            let session_id = state.ready_session_id()?;
            state.cancel_auto_advance();
            let ticket = state.begin_request(InFlight::Restore, &session_id);
            (state.generation, ticket, session_id)
        };

        let result = self.service.load_progress(&session_id).await;

        let mut state = self.state.lock().await;
        state.finish_request(ticket);
        if state.generation != generation {
            debug!(generation, "discarding stale progress restore");
            return Ok(RestoreOutcome::Discarded);
        }

        let progress = match result {
            Ok(progress) => progress,
            Err(err) => {
                warn!("loading saved progress failed: {err}");
                self.emit(ControllerEvent::RestoreFailed(err.to_string()));
                return Err(err.into());
            }
        };

        let mut answers = AnswerMap::new();
        for (question_id, raw) in progress.answers {
            if !state.contains(&question_id) {
                debug!(%question_id, "ignoring saved answer for unknown question");
                continue;
            }
            match LikertValue::try_from(raw) {
                Ok(value) => {
                    answers.insert(question_id, value);
                }
                Err(err) => warn!(%question_id, "ignoring saved answer: {err}"),
            }
        }
        let index = clamp_index(progress.current_question_index, state.questions.len());

        if let Err(source) = self.store.save_progress(&answers, index).await {
            let err = SessionError::store(source);
            self.emit(ControllerEvent::RestoreFailed(err.to_string()));
            return Err(err);
        }
        let answered = answers.len();
        state.answers = answers;
        state.current_index = index;
        info!(answered, index, "saved progress restored");
        self.emit(ControllerEvent::ProgressRestored { answered });
        self.emit(ControllerEvent::IndexChanged { index });
        Ok(RestoreOutcome::Restored { answered, index })
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.state.get_mut().cancel_auto_advance();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
