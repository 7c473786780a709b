//! Runs `quizcoach play` against a mocked Gemini endpoint with scripted input.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 10, "totalTokenCount": 20}
    })
}

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

/// Input that answers every question correctly, then declines to replay.
fn perfect_run_input() -> String {
    let mut input = String::new();
    for id in 1..=20u32 {
        let letter = ['a', 'b', 'c', 'd'][(id % 4) as usize];
        input.push_str(&format!("{letter}\n\n"));
    }
    input.push_str("n\n");
    input
}

fn write_config(dir: &TempDir, server: &MockServer) -> std::path::PathBuf {
    let config = dir.path().join("quizcoach.toml");
    std::fs::write(
        &config,
        format!(
            "default_provider = \"gemini\"\n\n[providers.gemini]\ntype = \"gemini\"\napi_key = \"test-key\"\nbase_url = \"{}\"\n",
            server.uri()
        ),
    )
    .unwrap();
    config
}

fn play(dir: &TempDir, config: &std::path::Path, input: String) -> assert_cmd::assert::Assert {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizcoach").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("QUIZCOACH_GEMINI_KEY")
        .arg("play")
        .arg("--name")
        .arg("Ada")
        .arg("--course")
        .arg("remote-work-1")
        .arg("--config")
        .arg(config)
        .arg("--mute")
        .write_stdin(input)
        .assert()
}

#[tokio::test(flavor = "multi_thread")]
async fn perfect_run_shows_verdict_feedback_and_flashcards() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("quiz shows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&quiz_json())))
        .expect(1)
        .mount(&server)
        .await;

    let feedback = serde_json::json!({
        "feedback": "Not bad at all. But I saw you hesitate.",
        "flashcards": [{"front": "Question 1?", "back": "B"}]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("sports coach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&feedback)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server);

    let assert = tokio::task::spawn_blocking(move || play(&dir, &config, perfect_run_input()))
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Question 20/20"))
        .stdout(predicate::str::contains("20/20"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("Strong"))
        .stdout(predicate::str::contains("I saw you hesitate"))
        .stdout(predicate::str::contains("Flashcards (1)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn quitting_mid_quiz_abandons_without_feedback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&quiz_json())))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server);

    let assert = tokio::task::spawn_blocking(move || play(&dir, &config, "b\n\nq\nn\n".into()))
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Correct!"))
        .stdout(predicate::str::contains("Question 2/20"))
        .stdout(predicate::str::contains("Quiz abandoned."))
        .stdout(predicate::str::contains("The verdict").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_offers_retry_then_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server);

    let assert = tokio::task::spawn_blocking(move || play(&dir, &config, "y\nn\n".into()))
        .await
        .unwrap();
    assert
        .failure()
        .stdout(predicate::str::contains("Could not generate the quiz"))
        .stderr(predicate::str::contains("no quiz could be generated"));
}
