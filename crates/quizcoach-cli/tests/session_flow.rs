//! End-to-end session tests: mock provider -> LLM gateway -> session controller.
//!
//! These drive a whole session the way the `play` command does, without any
//! network access.

use std::sync::{Arc, Mutex};

use quizcoach_core::error::GenerationFailure;
use quizcoach_core::gateway::{GatewaySettings, LlmGateway};
use quizcoach_core::model::Difficulty;
use quizcoach_core::session::{
    Advance, Cue, Intake, QuestionStatus, SessionController, SessionObserver, SessionState,
    SessionSettings, Stage,
};
use quizcoach_providers::mock::MockProvider;

const QUIZ_PROMPT_MARKER: &str = "quiz shows";
const FEEDBACK_PROMPT_MARKER: &str = "sports coach";

fn quiz_json() -> String {
    let questions: Vec<_> = (1..=20u32)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "text": format!("Question {id}?"),
                "options": ["A", "B", "C", "D"],
                "correct": id % 4,
            })
        })
        .collect();
    serde_json::json!({ "questions": questions }).to_string()
}

fn feedback_json() -> String {
    serde_json::json!({
        "feedback": "Not bad at all. But I saw you hesitate.",
        "flashcards": [{"front": "Question 1?", "back": "B"}]
    })
    .to_string()
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<Stage>>,
    failures: Mutex<Vec<String>>,
    cues: Mutex<Vec<Cue>>,
    timeouts: Mutex<Vec<u32>>,
}

impl SessionObserver for Recorder {
    fn on_stage_changed(&self, _from: Stage, to: Stage) {
        self.stages.lock().unwrap().push(to);
    }

    fn on_tick(&self, _question_id: u32, _remaining: u32) {}

    fn on_question_timed_out(&self, question_id: u32) {
        self.timeouts.lock().unwrap().push(question_id);
    }

    fn on_generation_failed(&self, error: &GenerationFailure) {
        self.failures.lock().unwrap().push(error.to_string());
    }

    fn on_cue(&self, cue: Cue) {
        self.cues.lock().unwrap().push(cue);
    }
}

fn controller(provider: Arc<MockProvider>, recorder: Arc<Recorder>) -> SessionController {
    let gateway = Arc::new(LlmGateway::new(provider, GatewaySettings::default()));
    SessionController::new(gateway.clone(), gateway).with_observer(recorder)
}

fn intake(difficulty: Difficulty) -> Intake {
    Intake {
        name: "Ada".into(),
        difficulty,
        content: "Water evaporates, condenses into clouds and falls as rain.".into(),
    }
}

/// Answer every remaining question, picking the right option when `right` says so.
fn answer_all(controller: &mut SessionController, right: impl Fn(u32) -> bool) -> Advance {
    loop {
        let SessionState::Quiz(progress) = controller.state() else {
            panic!("expected a quiz in progress, got {}", controller.stage());
        };
        let question = progress.current_question();
        let option = if right(question.id) {
            question.correct
        } else {
            (question.correct + 1) % 4
        };
        if progress.status() == QuestionStatus::Open {
            controller.select_option(option).unwrap();
        }
        match controller.advance().unwrap() {
            Advance::Completed => return Advance::Completed,
            Advance::NextQuestion(_) => {}
        }
    }
}

#[tokio::test]
async fn perfect_session_reaches_results_with_coach_feedback() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("{}")
            .respond_when(QUIZ_PROMPT_MARKER, &quiz_json())
            .respond_when(FEEDBACK_PROMPT_MARKER, &feedback_json()),
    );
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(provider.clone(), recorder.clone());

    controller.start(intake(Difficulty::Master)).unwrap();
    controller.await_gateway().await;
    assert_eq!(controller.stage(), Stage::Quiz);

    answer_all(&mut controller, |_| true);
    assert_eq!(controller.stage(), Stage::AnalyzingResults);
    controller.await_gateway().await;

    let SessionState::Results(results) = controller.state() else {
        panic!("expected results, got {}", controller.stage());
    };
    assert_eq!(results.outcome.score, 20);
    assert!(results.outcome.wrong_answers.is_empty());
    assert!(!results.used_fallback);
    assert_eq!(results.feedback.flashcards.len(), 1);
    assert!(controller.win_signalled());

    assert_eq!(provider.call_count(), 2);
    let feedback_prompt = provider.last_request().unwrap().prompt;
    assert!(feedback_prompt.contains("Score: 20/20"));
    assert!(feedback_prompt.contains("Flawless run"));

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            Stage::GeneratingQuiz,
            Stage::Quiz,
            Stage::AnalyzingResults,
            Stage::Results
        ]
    );
    let cues = recorder.cues.lock().unwrap();
    assert_eq!(cues.first(), Some(&Cue::Intro));
    assert_eq!(cues.iter().filter(|c| **c == Cue::Win).count(), 1);
}

#[tokio::test]
async fn failed_feedback_falls_back_but_keeps_the_score() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("{}")
            .respond_when(QUIZ_PROMPT_MARKER, &quiz_json())
            .fail_when(FEEDBACK_PROMPT_MARKER, "HTTP 503"),
    );
    let mut controller = controller(provider, Arc::new(Recorder::default()));

    controller.start(intake(Difficulty::Bachelor)).unwrap();
    controller.await_gateway().await;
    answer_all(&mut controller, |id| id % 2 == 0);
    controller.await_gateway().await;

    let SessionState::Results(results) = controller.state() else {
        panic!("expected results, got {}", controller.stage());
    };
    assert_eq!(results.outcome.score, 10);
    assert_eq!(results.outcome.wrong_answers.len(), 10);
    assert!(results.used_fallback);
    assert!(results.feedback.flashcards.is_empty());
    assert!(!controller.win_signalled());
}

#[tokio::test]
async fn malformed_quiz_returns_to_onboarding_and_can_retry() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("{}")
            .respond_when(QUIZ_PROMPT_MARKER, "I cannot write a quiz about this."),
    );
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(provider.clone(), recorder.clone());

    controller.start(intake(Difficulty::Expert)).unwrap();
    controller.await_gateway().await;

    assert_eq!(controller.stage(), Stage::Onboarding);
    let failures = recorder.failures.lock().unwrap().clone();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("not valid JSON"));

    // The learner can simply try again
    controller.start(intake(Difficulty::Expert)).unwrap();
    controller.await_gateway().await;
    assert_eq!(controller.stage(), Stage::Onboarding);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_question_counts_as_unanswered() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("{}")
            .respond_when(QUIZ_PROMPT_MARKER, &quiz_json())
            .respond_when(FEEDBACK_PROMPT_MARKER, &feedback_json()),
    );
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(provider.clone(), recorder.clone());

    controller.start(intake(Difficulty::Expert)).unwrap();
    controller.await_gateway().await;

    // Let the first question's 20 second timer run out
    loop {
        let SessionState::Quiz(progress) = controller.state() else {
            panic!("expected a quiz in progress");
        };
        if progress.status() == QuestionStatus::TimedOut {
            break;
        }
        controller.step().await;
    }
    assert_eq!(*recorder.timeouts.lock().unwrap(), vec![1]);
    assert!(controller.select_option(0).is_err());

    answer_all(&mut controller, |_| true);
    controller.await_gateway().await;

    let SessionState::Results(results) = controller.state() else {
        panic!("expected results, got {}", controller.stage());
    };
    assert_eq!(results.outcome.score, 19);
    assert_eq!(results.outcome.unanswered(), 1);
    assert_eq!(results.outcome.wrong_answers[0].selected, None);
    assert!(provider
        .last_request()
        .unwrap()
        .prompt
        .contains("Learner's answer: \"Time's up\""));
}

#[tokio::test]
async fn restart_mid_generation_ignores_the_late_quiz() {
    let provider = Arc::new(
        MockProvider::with_fixed_response("{}")
            .respond_when(QUIZ_PROMPT_MARKER, &quiz_json())
            .with_latency(std::time::Duration::from_millis(20)),
    );
    let mut controller = controller(provider, Arc::new(Recorder::default()))
        .with_settings(SessionSettings { muted: true });

    controller.start(intake(Difficulty::Bachelor)).unwrap();
    controller.restart();
    assert_eq!(controller.stage(), Stage::Onboarding);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    while controller.try_step().is_some() {}
    assert_eq!(controller.stage(), Stage::Onboarding);
}
