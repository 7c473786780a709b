//! Session controller.
//!
//! Drives one learner through intake, quiz generation, the timed quiz,
//! scoring, feedback synthesis and results. The controller is a plain struct
//! mutated through `&mut self`; gateway calls and question timers run as
//! tokio tasks and report back as [`SessionEvent`]s on a channel the
//! controller owns. Each task is tagged with a [`Ticket`], and an event is
//! only applied while the session is still waiting for that ticket.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::error::{FeedbackFailure, GenerationFailure, SessionError};
use crate::model::{Difficulty, FeedbackData, QuizData, QuizQuestion, UserAnswers, UserProfile};
use crate::scoring::{score_quiz, ScoreOutcome};
use crate::timer::{Countdown, QuestionTimer, TickOutcome};
use crate::traits::{FeedbackRequest, FeedbackSynthesizer, QuizGenerator};

/// Identifies one gateway request or one question timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn first() -> Self {
        Ticket(1)
    }

    fn next(self) -> Self {
        Ticket(self.0 + 1)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle stage, without the data each stage carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Onboarding,
    GeneratingQuiz,
    Quiz,
    AnalyzingResults,
    Results,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Onboarding => write!(f, "onboarding"),
            Stage::GeneratingQuiz => write!(f, "generating the quiz"),
            Stage::Quiz => write!(f, "taking the quiz"),
            Stage::AnalyzingResults => write!(f, "analyzing results"),
            Stage::Results => write!(f, "showing results"),
        }
    }
}

/// Where the session is, with exactly the data valid at that point.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Onboarding,
    GeneratingQuiz {
        profile: UserProfile,
        ticket: Ticket,
    },
    Quiz(QuizProgress),
    AnalyzingResults {
        profile: UserProfile,
        quiz: QuizData,
        outcome: ScoreOutcome,
        ticket: Ticket,
    },
    Results(SessionResults),
}

impl SessionState {
    pub fn stage(&self) -> Stage {
        match self {
            SessionState::Onboarding => Stage::Onboarding,
            SessionState::GeneratingQuiz { .. } => Stage::GeneratingQuiz,
            SessionState::Quiz(_) => Stage::Quiz,
            SessionState::AnalyzingResults { .. } => Stage::AnalyzingResults,
            SessionState::Results(_) => Stage::Results,
        }
    }
}

/// State of the question currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Open,
    Answered(usize),
    TimedOut,
}

/// An in-progress quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizProgress {
    profile: UserProfile,
    quiz: QuizData,
    answers: UserAnswers,
    current: usize,
    countdown: Countdown,
    timer_ticket: Ticket,
}

impl QuizProgress {
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn quiz(&self) -> &QuizData {
        &self.quiz
    }

    pub fn answers(&self) -> &UserAnswers {
        &self.answers
    }

    /// Zero-based index of the current question.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.quiz.questions()[self.current]
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn timer_ticket(&self) -> Ticket {
        self.timer_ticket
    }

    pub fn status(&self) -> QuestionStatus {
        match self.answers.get(self.current_question().id) {
            Some(selected) => QuestionStatus::Answered(selected),
            None if self.countdown.is_expired() => QuestionStatus::TimedOut,
            None => QuestionStatus::Open,
        }
    }

    pub fn can_advance(&self) -> bool {
        self.status() != QuestionStatus::Open
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.quiz.len()
    }
}

/// Everything shown once the session is over.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub profile: UserProfile,
    pub quiz: QuizData,
    pub outcome: ScoreOutcome,
    pub feedback: FeedbackData,
    /// The feedback gateway failed and the fallback text is shown.
    pub used_fallback: bool,
}

/// What a learner fills in before starting.
#[derive(Debug, Clone)]
pub struct Intake {
    pub name: String,
    pub difficulty: Difficulty,
    pub content: String,
}

/// Completion messages delivered to the controller.
#[derive(Debug)]
pub enum SessionEvent {
    QuizGenerated {
        ticket: Ticket,
        result: Result<QuizData, GenerationFailure>,
    },
    FeedbackSynthesized {
        ticket: Ticket,
        result: Result<FeedbackData, FeedbackFailure>,
    },
    TimerTick {
        ticket: Ticket,
    },
}

/// Whether an event changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The session no longer waits for this ticket; the event was dropped.
    Stale,
}

/// Result of a successful [`SessionController::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at this index.
    NextQuestion(usize),
    /// The last question was passed; results are being analyzed.
    Completed,
}

/// Sound cues the front end may play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Intro,
    Click,
    Win,
}

/// Front-end hooks for session activity.
pub trait SessionObserver: Send + Sync {
    fn on_stage_changed(&self, from: Stage, to: Stage);
    fn on_tick(&self, question_id: u32, remaining: u32);
    fn on_question_timed_out(&self, question_id: u32);
    fn on_generation_failed(&self, error: &GenerationFailure);
    /// Only called while the session is not muted.
    fn on_cue(&self, cue: Cue);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_stage_changed(&self, _: Stage, _: Stage) {}
    fn on_tick(&self, _: u32, _: u32) {}
    fn on_question_timed_out(&self, _: u32) {}
    fn on_generation_failed(&self, _: &GenerationFailure) {}
    fn on_cue(&self, _: Cue) {}
}

/// Injected presentation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub muted: bool,
}

/// The session state machine.
pub struct SessionController {
    state: SessionState,
    quiz_gateway: Arc<dyn QuizGenerator>,
    feedback_gateway: Arc<dyn FeedbackSynthesizer>,
    observer: Arc<dyn SessionObserver>,
    settings: SessionSettings,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    last_ticket: Ticket,
    pending: Option<AbortHandle>,
    timer: Option<QuestionTimer>,
    win_signalled: bool,
}

impl SessionController {
    pub fn new(
        quiz_gateway: Arc<dyn QuizGenerator>,
        feedback_gateway: Arc<dyn FeedbackSynthesizer>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: SessionState::Onboarding,
            quiz_gateway,
            feedback_gateway,
            observer: Arc::new(NoopObserver),
            settings: SessionSettings::default(),
            events_tx,
            events_rx,
            last_ticket: Ticket(0),
            pending: None,
            timer: None,
            win_signalled: false,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn is_muted(&self) -> bool {
        self.settings.muted
    }

    /// Flip the mute setting, returning the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.settings.muted = !self.settings.muted;
        self.settings.muted
    }

    /// Whether this session already emitted its win signal.
    pub fn win_signalled(&self) -> bool {
        self.win_signalled
    }

    // -----------------------------------------------------------------------
    // Learner actions
    // -----------------------------------------------------------------------

    /// Leave onboarding and request a quiz for the given intake.
    pub fn start(&mut self, intake: Intake) -> Result<(), SessionError> {
        if self.stage() != Stage::Onboarding {
            return Err(self.rejected("start a quiz"));
        }
        let profile = UserProfile::new(intake.name, intake.difficulty, intake.content)?;
        self.cue(Cue::Intro);

        let ticket = self.next_ticket();
        let gateway = Arc::clone(&self.quiz_gateway);
        let events = self.events_tx.clone();
        let content = profile.content().to_string();
        let difficulty = profile.difficulty();
        let task = tokio::spawn(async move {
            let result = gateway.generate_quiz(&content, difficulty).await;
            let _ = events.send(SessionEvent::QuizGenerated { ticket, result });
        });
        self.replace_pending(task.abort_handle());

        info!(
            name = profile.name(),
            %difficulty,
            content_chars = profile.content().chars().count(),
            %ticket,
            "requesting quiz"
        );
        self.enter(
            Stage::Onboarding,
            SessionState::GeneratingQuiz { profile, ticket },
        );
        Ok(())
    }

    /// Record an answer for the current question. Returns whether it was right.
    pub fn select_option(&mut self, option: usize) -> Result<bool, SessionError> {
        let stage = self.stage();
        let SessionState::Quiz(progress) = &mut self.state else {
            return Err(SessionError::InvalidTransition {
                stage,
                action: "answer",
            });
        };
        let question_id = progress.current_question().id;
        match progress.status() {
            QuestionStatus::Answered(_) => return Err(SessionError::AlreadyAnswered(question_id)),
            QuestionStatus::TimedOut => return Err(SessionError::TimedOut(question_id)),
            QuestionStatus::Open => {}
        }
        progress.answers.record(question_id, option)?;
        let correct = progress.current_question().correct == option;
        self.timer = None;
        debug!(question_id, option, correct, "answer recorded");
        Ok(correct)
    }

    /// Move past the current question once it is answered or timed out.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let (is_last, difficulty) = match &self.state {
            SessionState::Quiz(progress) => {
                if !progress.can_advance() {
                    return Err(SessionError::CannotAdvance(progress.current_question().id));
                }
                (progress.is_last(), progress.profile.difficulty())
            }
            _ => return Err(self.rejected("advance")),
        };

        self.cue(Cue::Click);
        self.timer = None;

        if is_last {
            self.complete_quiz();
            return Ok(Advance::Completed);
        }

        let ticket = self.next_ticket();
        let timer = QuestionTimer::start(ticket, difficulty.timer_secs(), self.events_tx.clone());
        let mut index = 0;
        if let SessionState::Quiz(progress) = &mut self.state {
            progress.current += 1;
            progress.countdown = Countdown::for_difficulty(difficulty);
            progress.timer_ticket = ticket;
            index = progress.current;
        }
        self.timer = Some(timer);
        Ok(Advance::NextQuestion(index))
    }

    /// Abandon the quiz in progress and go back to onboarding.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        if self.stage() != Stage::Quiz {
            return Err(self.rejected("abort"));
        }
        self.timer = None;
        info!("quiz aborted");
        self.enter(Stage::Quiz, SessionState::Onboarding);
        Ok(())
    }

    /// Discard everything and return to onboarding, from any stage.
    pub fn restart(&mut self) {
        self.timer = None;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.win_signalled = false;
        let from = self.stage();
        if from != Stage::Onboarding {
            info!(%from, "session restarted");
            self.enter(from, SessionState::Onboarding);
        }
    }

    // -----------------------------------------------------------------------
    // Event processing
    // -----------------------------------------------------------------------

    /// Wait for the next task completion or timer tick.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Wait for the next event and apply it.
    pub async fn step(&mut self) -> Option<EventOutcome> {
        let event = self.next_event().await?;
        Some(self.handle_event(event))
    }

    /// Apply an event that is already queued, without waiting.
    pub fn try_step(&mut self) -> Option<EventOutcome> {
        let event = self.events_rx.try_recv().ok()?;
        Some(self.handle_event(event))
    }

    /// Process events until the session is no longer waiting on a gateway.
    pub async fn await_gateway(&mut self) {
        while matches!(
            self.stage(),
            Stage::GeneratingQuiz | Stage::AnalyzingResults
        ) {
            if self.step().await.is_none() {
                break;
            }
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> EventOutcome {
        match event {
            SessionEvent::QuizGenerated { ticket, result } => self.on_quiz_generated(ticket, result),
            SessionEvent::FeedbackSynthesized { ticket, result } => {
                self.on_feedback_synthesized(ticket, result)
            }
            SessionEvent::TimerTick { ticket } => self.on_timer_tick(ticket),
        }
    }

    fn on_quiz_generated(
        &mut self,
        ticket: Ticket,
        result: Result<QuizData, GenerationFailure>,
    ) -> EventOutcome {
        let profile = match std::mem::replace(&mut self.state, SessionState::Onboarding) {
            SessionState::GeneratingQuiz { profile, ticket: t } if t == ticket => profile,
            other => {
                self.state = other;
                debug!(%ticket, "discarding stale quiz response");
                return EventOutcome::Stale;
            }
        };
        self.pending = None;

        match result {
            Ok(quiz) => {
                info!(questions = quiz.len(), %ticket, "quiz ready");
                let difficulty = profile.difficulty();
                let timer_ticket = self.next_ticket();
                self.timer = Some(QuestionTimer::start(
                    timer_ticket,
                    difficulty.timer_secs(),
                    self.events_tx.clone(),
                ));
                let progress = QuizProgress {
                    profile,
                    quiz,
                    answers: UserAnswers::new(),
                    current: 0,
                    countdown: Countdown::for_difficulty(difficulty),
                    timer_ticket,
                };
                self.enter(Stage::GeneratingQuiz, SessionState::Quiz(progress));
            }
            Err(error) => {
                warn!(%error, "quiz generation failed");
                self.observer.on_generation_failed(&error);
                self.enter(Stage::GeneratingQuiz, SessionState::Onboarding);
            }
        }
        EventOutcome::Applied
    }

    fn on_feedback_synthesized(
        &mut self,
        ticket: Ticket,
        result: Result<FeedbackData, FeedbackFailure>,
    ) -> EventOutcome {
        let (profile, quiz, outcome) =
            match std::mem::replace(&mut self.state, SessionState::Onboarding) {
                SessionState::AnalyzingResults {
                    profile,
                    quiz,
                    outcome,
                    ticket: t,
                } if t == ticket => (profile, quiz, outcome),
                other => {
                    self.state = other;
                    debug!(%ticket, "discarding stale feedback response");
                    return EventOutcome::Stale;
                }
            };
        self.pending = None;

        let (feedback, used_fallback) = match result {
            Ok(feedback) => (feedback, false),
            Err(error) => {
                warn!(%error, "feedback synthesis failed, using fallback feedback");
                (FeedbackData::fallback(), true)
            }
        };
        self.enter(
            Stage::AnalyzingResults,
            SessionState::Results(SessionResults {
                profile,
                quiz,
                outcome,
                feedback,
                used_fallback,
            }),
        );
        EventOutcome::Applied
    }

    fn on_timer_tick(&mut self, ticket: Ticket) -> EventOutcome {
        let SessionState::Quiz(progress) = &mut self.state else {
            return EventOutcome::Stale;
        };
        if progress.timer_ticket != ticket || progress.status() != QuestionStatus::Open {
            return EventOutcome::Stale;
        }
        let question_id = progress.current_question().id;
        match progress.countdown.tick() {
            TickOutcome::Running(remaining) => {
                self.observer.on_tick(question_id, remaining);
            }
            TickOutcome::Expired => {
                self.timer = None;
                info!(question_id, "time is up");
                self.observer.on_tick(question_id, 0);
                self.observer.on_question_timed_out(question_id);
            }
            TickOutcome::AlreadyExpired => return EventOutcome::Stale,
        }
        EventOutcome::Applied
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Score the quiz, signal a win, and request feedback.
    fn complete_quiz(&mut self) {
        let progress = match std::mem::replace(&mut self.state, SessionState::Onboarding) {
            SessionState::Quiz(progress) => progress,
            other => {
                self.state = other;
                return;
            }
        };
        let QuizProgress {
            profile,
            quiz,
            answers,
            ..
        } = progress;

        let outcome = score_quiz(&quiz, &answers);
        info!(
            score = outcome.score,
            total = outcome.total,
            unanswered = outcome.unanswered(),
            "quiz scored"
        );
        if outcome.is_win() && !self.win_signalled {
            self.win_signalled = true;
            self.cue(Cue::Win);
        }

        let request = FeedbackRequest {
            name: profile.name().to_string(),
            score: outcome.score,
            total: outcome.total,
            wrong_answers: outcome.wrong_answers.clone(),
            difficulty: profile.difficulty(),
        };
        let ticket = self.next_ticket();
        let gateway = Arc::clone(&self.feedback_gateway);
        let events = self.events_tx.clone();
        let task = tokio::spawn(async move {
            let result = gateway.synthesize_feedback(&request).await;
            let _ = events.send(SessionEvent::FeedbackSynthesized { ticket, result });
        });
        self.replace_pending(task.abort_handle());

        self.enter(
            Stage::Quiz,
            SessionState::AnalyzingResults {
                profile,
                quiz,
                outcome,
                ticket,
            },
        );
    }

    fn enter(&mut self, from: Stage, next: SessionState) {
        let to = next.stage();
        self.state = next;
        info!(%from, %to, "session stage changed");
        self.observer.on_stage_changed(from, to);
    }

    fn next_ticket(&mut self) -> Ticket {
        self.last_ticket = self.last_ticket.next();
        self.last_ticket
    }

    fn replace_pending(&mut self, task: AbortHandle) {
        if let Some(previous) = self.pending.replace(task) {
            previous.abort();
        }
    }

    fn cue(&self, cue: Cue) {
        if !self.settings.muted {
            self.observer.on_cue(cue);
        }
    }

    fn rejected(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            stage: self.stage(),
            action,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
