//! Prompt construction for quiz generation and feedback synthesis.

use std::fmt::Write as _;

use crate::model::{Difficulty, QUESTIONS_PER_QUIZ};
use crate::traits::FeedbackRequest;

/// Knobs that shape both prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    /// Language the quiz and the feedback are written in.
    pub language: String,
    /// The corpus is cut to this many characters before prompting.
    pub content_char_limit: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            language: "French".to_string(),
            content_char_limit: 800_000,
        }
    }
}

/// Cut `text` to at most `limit` characters, on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn build_quiz_prompt(content: &str, difficulty: Difficulty, settings: &PromptSettings) -> String {
    let corpus = truncate_chars(content, settings.content_char_limit);
    format!(
        r#"You are an expert writer of educational TV quiz shows. Analyze the following course material:
"""
{corpus}
"""

YOUR MISSION: write a gripping quiz of exactly {count} multiple-choice questions, 4 options each, in {language}.
DIFFICULTY: {difficulty}. {nuance}

IMPORTANT: vary the question formats. Do not only ask "What is...". Mix these formats:
1. Standard (What is the definition of...)
2. True or false, phrased as multiple choice ("The following statement is TRUE...")
3. Odd one out (Which of these four does not belong?)
4. Fill in the blank ("Complete: the concept of X implies Y and...")
5. Short scenario (a brief practical case)

Respond with JSON of exactly this shape:
{{"questions": [{{"id": 1, "text": "...", "options": ["...", "...", "...", "..."], "correct": 0}}]}}
Ids are unique integers. "correct" is the zero-based index (0-3) of the right option."#,
        count = QUESTIONS_PER_QUIZ,
        language = settings.language,
        nuance = difficulty.prompt_nuance(),
    )
}

pub fn build_feedback_prompt(request: &FeedbackRequest, settings: &PromptSettings) -> String {
    let mut mistakes = String::new();
    for (i, wrong) in request.wrong_answers.iter().enumerate() {
        if i > 0 {
            mistakes.push_str("\n---\n");
        }
        let given = wrong.selected_option().unwrap_or("Time's up");
        let _ = write!(
            mistakes,
            "Question: \"{}\".\nRight answer: \"{}\".\nLearner's answer: \"{}\".",
            wrong.question.text,
            wrong.question.correct_option(),
            given
        );
    }
    if mistakes.is_empty() {
        mistakes.push_str("None. Flawless run.");
    }

    format!(
        r#"You are an educational AI with the personality of a slightly crazy, sarcastic sports coach.
Learner: {name}
Score: {score}/{total}
Level: {difficulty}
Language: {language}.

Write SHORT, punchy feedback (two sentences at most).
- Below 10/20: "This is a disaster. {name}, are you asleep?"
- Above 16/20: "Not bad at all. But I saw you hesitate."
{expert_rule}
Also write corrective flashcards for the mistakes below (front: the question, back: a simple explanation).

Respond with JSON of exactly this shape:
{{"feedback": "...", "flashcards": [{{"front": "...", "back": "..."}}]}}

Mistakes:
{mistakes}"#,
        name = request.name,
        score = request.score,
        total = request.total,
        difficulty = request.difficulty,
        language = settings.language,
        expert_rule = expert_rule(request),
    )
}

fn expert_rule(request: &FeedbackRequest) -> &'static str {
    // Below 16/20 in expert mode
    if request.difficulty == Difficulty::Expert && request.score * 20 < request.total * 16 {
        "\nSPECIAL EXPERT RULE: \"DISHONOR! That was awful. Start again right now before I lose my temper.\"\n"
    } else {
        ""
    }
}
