//! The `quizcoach validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizcoach_core::schema::{audit_quiz, RawQuizData};
use quizcoach_core::traits::extract_json_from_markdown;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&quiz_path)
        .with_context(|| format!("failed to read {}", quiz_path.display()))?;
    let payload = extract_json_from_markdown(&content);
    let raw: RawQuizData = serde_json::from_str(&payload)
        .with_context(|| format!("{} is not a quiz JSON document", quiz_path.display()))?;

    println!(
        "Quiz: {} ({} questions)",
        quiz_path.display(),
        raw.questions.len()
    );

    let violations = audit_quiz(&raw);
    for v in &violations {
        println!("  ERROR: {v}");
    }

    if violations.is_empty() {
        println!("Quiz is valid.");
        Ok(())
    } else {
        anyhow::bail!("{} schema violation(s) found", violations.len())
    }
}
