//! Core data model types for quizcoach.
//!
//! These are the fundamental types the session engine works with: the
//! learner's profile, the generated quiz, the answers recorded while it is
//! administered, and the feedback produced at the end.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaViolation, SessionError};
use crate::schema::{RawFeedbackData, RawQuizData};

/// Number of questions in every generated quiz.
pub const QUESTIONS_PER_QUIZ: usize = 20;

/// Number of options offered by every question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Difficulty level chosen at intake, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Bachelor,
    Master,
    Expert,
}

/// Per-question timer for each difficulty, in seconds, in declaration order.
pub const TIMER_TABLE: [(Difficulty, u32); 3] = [
    (Difficulty::Bachelor, 45),
    (Difficulty::Master, 30),
    (Difficulty::Expert, 20),
];

impl Difficulty {
    /// Seconds allowed per question, looked up in [`TIMER_TABLE`].
    pub fn timer_secs(self) -> u32 {
        TIMER_TABLE[self as usize].1
    }

    /// How hard the generated questions should push, phrased for the prompt.
    pub fn prompt_nuance(self) -> &'static str {
        match self {
            Difficulty::Bachelor => {
                "Bachelor level: fundamental questions and definitions. 45s timer. Stay accessible."
            }
            Difficulty::Master => {
                "Master level: analysis and synthesis questions. 30s timer. Require real thinking."
            }
            Difficulty::Expert => {
                "EXPERT MODE: trick questions, obscure details, exceptions. 20s timer. Be merciless."
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Bachelor => write!(f, "Bachelor"),
            Difficulty::Master => write!(f, "Master"),
            Difficulty::Expert => write!(f, "Expert"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bachelor" => Ok(Difficulty::Bachelor),
            "master" => Ok(Difficulty::Master),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Who is taking the quiz and on what material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    name: String,
    difficulty: Difficulty,
    content: String,
}

impl UserProfile {
    /// Build a profile, rejecting a blank name or empty content.
    pub fn new(
        name: impl Into<String>,
        difficulty: Difficulty,
        content: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let name = name.into();
        let content = content.into();
        if name.trim().is_empty() {
            return Err(SessionError::MissingName);
        }
        if content.trim().is_empty() {
            return Err(SessionError::MissingContent);
        }
        Ok(Self {
            name: name.trim().to_string(),
            difficulty,
            content,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub text: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    /// Index of the right option, always below [`OPTIONS_PER_QUESTION`].
    pub correct: usize,
}

impl QuizQuestion {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }
}

/// A validated quiz: exactly [`QUESTIONS_PER_QUIZ`] questions with unique ids.
///
/// The only way to obtain one is through validation, either
/// [`QuizData::new`] or deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuizData")]
pub struct QuizData {
    questions: Vec<QuizQuestion>,
}

impl QuizData {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, SchemaViolation> {
        if questions.len() != QUESTIONS_PER_QUIZ {
            return Err(SchemaViolation::QuestionCount {
                expected: QUESTIONS_PER_QUIZ,
                found: questions.len(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(SchemaViolation::DuplicateId(q.id));
            }
            if q.correct >= OPTIONS_PER_QUESTION {
                return Err(SchemaViolation::CorrectOutOfRange {
                    question_id: q.id,
                    correct: q.correct as i64,
                });
            }
            if q.text.trim().is_empty() {
                return Err(SchemaViolation::EmptyQuestionText(q.id));
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Answers recorded during a quiz, keyed by question id.
///
/// The first answer for a question wins; later ones are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAnswers(BTreeMap<u32, usize>);

impl UserAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question_id: u32, option: usize) -> Result<(), SessionError> {
        if option >= OPTIONS_PER_QUESTION {
            return Err(SessionError::OptionOutOfRange(option));
        }
        if self.0.contains_key(&question_id) {
            return Err(SessionError::AlreadyAnswered(question_id));
        }
        self.0.insert(question_id, option);
        Ok(())
    }

    pub fn get(&self, question_id: u32) -> Option<usize> {
        self.0.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A question the learner missed, with what they picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrongAnswer {
    pub question: QuizQuestion,
    /// `None` when the question was never answered (e.g. time ran out).
    #[serde(rename = "selectedIndex", serialize_with = "serialize_selected")]
    pub selected: Option<usize>,
}

impl WrongAnswer {
    /// The selected option index, or `-1` when unanswered.
    pub fn selected_index(&self) -> i32 {
        self.selected.map_or(-1, |i| i as i32)
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.question.options.get(i))
            .map(String::as_str)
    }
}

fn serialize_selected<S: serde::Serializer>(
    selected: &Option<usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i32(selected.map_or(-1, |i| i as i32))
}

/// A remediation card: the missed concept and its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// Coach feedback produced once the quiz is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeedbackData")]
pub struct FeedbackData {
    pub feedback: String,
    pub flashcards: Vec<Flashcard>,
}

/// Feedback shown when the synthesis gateway fails.
pub const FALLBACK_FEEDBACK: &str =
    "The coach stepped out for a coffee (API error). Still, well done for the effort!";

impl FeedbackData {
    pub fn fallback() -> Self {
        Self {
            feedback: FALLBACK_FEEDBACK.to_string(),
            flashcards: Vec::new(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(id: u32, correct: usize) -> QuizQuestion {
        QuizQuestion {
            id,
            text: format!("Question {id}?"),
            options: [
                format!("q{id} option A"),
                format!("q{id} option B"),
                format!("q{id} option C"),
                format!("q{id} option D"),
            ],
            correct,
        }
    }

    /// A valid quiz whose correct answers cycle through 0..4.
    pub fn quiz() -> QuizData {
        let questions = (1..=QUESTIONS_PER_QUIZ as u32)
            .map(|id| question(id, (id as usize) % OPTIONS_PER_QUESTION))
            .collect();
        QuizData::new(questions).unwrap()
    }
}
