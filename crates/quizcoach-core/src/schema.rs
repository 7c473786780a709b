//! Wire schema for gateway responses.
//!
//! Responses are first deserialized into loose `Raw*` structs and then
//! converted into the domain types with `TryFrom`, so a response with three
//! options or 19 questions becomes a [`SchemaViolation`] rather than an
//! opaque serde error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FeedbackFailure, GenerationFailure, SchemaViolation};
use crate::model::{
    FeedbackData, Flashcard, QuizData, QuizQuestion, OPTIONS_PER_QUESTION, QUESTIONS_PER_QUIZ,
};
use crate::traits::extract_json_from_markdown;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuizData {
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeedbackData {
    pub feedback: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl TryFrom<RawQuestion> for QuizQuestion {
    type Error = SchemaViolation;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        if !(0..OPTIONS_PER_QUESTION as i64).contains(&raw.correct) {
            return Err(SchemaViolation::CorrectOutOfRange {
                question_id: raw.id,
                correct: raw.correct,
            });
        }
        let found = raw.options.len();
        let options: [String; OPTIONS_PER_QUESTION] =
            raw.options
                .try_into()
                .map_err(|_| SchemaViolation::OptionCount {
                    question_id: raw.id,
                    found,
                })?;
        Ok(QuizQuestion {
            id: raw.id,
            text: raw.text,
            options,
            correct: raw.correct as usize,
        })
    }
}

impl TryFrom<RawQuizData> for QuizData {
    type Error = SchemaViolation;

    fn try_from(raw: RawQuizData) -> Result<Self, Self::Error> {
        let questions = raw
            .questions
            .into_iter()
            .map(QuizQuestion::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        QuizData::new(questions)
    }
}

impl TryFrom<RawFeedbackData> for FeedbackData {
    type Error = SchemaViolation;

    fn try_from(raw: RawFeedbackData) -> Result<Self, Self::Error> {
        if raw.feedback.trim().is_empty() {
            return Err(SchemaViolation::EmptyFeedback);
        }
        Ok(FeedbackData {
            feedback: raw.feedback,
            flashcards: raw.flashcards,
        })
    }
}

/// List every schema violation in a raw quiz, not just the first.
pub fn audit_quiz(raw: &RawQuizData) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if raw.questions.len() != QUESTIONS_PER_QUIZ {
        violations.push(SchemaViolation::QuestionCount {
            expected: QUESTIONS_PER_QUIZ,
            found: raw.questions.len(),
        });
    }

    let mut seen = HashSet::new();
    for q in &raw.questions {
        if !seen.insert(q.id) {
            violations.push(SchemaViolation::DuplicateId(q.id));
        }
        if q.text.trim().is_empty() {
            violations.push(SchemaViolation::EmptyQuestionText(q.id));
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            violations.push(SchemaViolation::OptionCount {
                question_id: q.id,
                found: q.options.len(),
            });
        }
        if !(0..OPTIONS_PER_QUESTION as i64).contains(&q.correct) {
            violations.push(SchemaViolation::CorrectOutOfRange {
                question_id: q.id,
                correct: q.correct,
            });
        }
    }

    violations
}

/// Parse an LLM quiz response, tolerating markdown fences around the JSON.
pub fn parse_quiz_response(response: &str) -> Result<QuizData, GenerationFailure> {
    let payload = extract_json_from_markdown(response);
    let raw: RawQuizData = serde_json::from_str(&payload)
        .map_err(|e| GenerationFailure::Malformed(e.to_string()))?;
    Ok(QuizData::try_from(raw)?)
}

/// Parse an LLM feedback response, tolerating markdown fences around the JSON.
pub fn parse_feedback_response(response: &str) -> Result<FeedbackData, FeedbackFailure> {
    let payload = extract_json_from_markdown(response);
    let raw: RawFeedbackData = serde_json::from_str(&payload)
        .map_err(|e| FeedbackFailure::Malformed(e.to_string()))?;
    Ok(FeedbackData::try_from(raw)?)
}

#[cfg(test)]
pub(crate) fn sample_quiz_json(count: usize) -> String {
    let questions: Vec<_> = (1..=count as u32)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_quiz() {
        let quiz = parse_quiz_response(&sample_quiz_json(20)).unwrap();
        assert_eq!(quiz.len(), 20);
        assert_eq!(quiz.questions()[0].correct, 1);
        assert_eq!(quiz.questions()[3].correct, 0);
    }

    #[test]
    fn parses_quiz_wrapped_in_fences() {
        let response = format!("Here you go:\n```json\n{}\n```\n", sample_quiz_json(20));
        assert!(parse_quiz_response(&response).is_ok());
    }

    #[test]
    fn short_quiz_is_schema_violation() {
        let err = parse_quiz_response(&sample_quiz_json(12)).unwrap_err();
        assert!(matches!(
            err,
            GenerationFailure::Schema(SchemaViolation::QuestionCount { found: 12, .. })
        ));
    }

    #[test]
    fn three_options_is_schema_violation() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_quiz_json(20)).unwrap();
        value["questions"][4]["options"] = serde_json::json!(["x", "y", "z"]);
        let err = parse_quiz_response(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            GenerationFailure::Schema(SchemaViolation::OptionCount {
                question_id: 5,
                found: 3
            })
        ));
    }

    #[test]
    fn negative_correct_index_is_schema_violation() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_quiz_json(20)).unwrap();
        value["questions"][0]["correct"] = serde_json::json!(-1);
        let err = parse_quiz_response(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            GenerationFailure::Schema(SchemaViolation::CorrectOutOfRange { correct: -1, .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_quiz_response("the model refused").unwrap_err();
        assert!(matches!(err, GenerationFailure::Malformed(_)));
    }

    #[test]
    fn quiz_data_deserializes_through_validation() {
        assert!(serde_json::from_str::<QuizData>(&sample_quiz_json(20)).is_ok());
        assert!(serde_json::from_str::<QuizData>(&sample_quiz_json(21)).is_err());
    }

    #[test]
    fn audit_reports_every_violation() {
        let raw = RawQuizData {
            questions: vec![
                RawQuestion {
                    id: 1,
                    text: String::new(),
                    options: vec!["a".into(), "b".into()],
                    correct: 7,
                },
                RawQuestion {
                    id: 1,
                    text: "ok".into(),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct: 0,
                },
            ],
        };
        let violations = audit_quiz(&raw);
        assert_eq!(violations.len(), 5);
        assert!(violations.contains(&SchemaViolation::DuplicateId(1)));
        assert!(violations.contains(&SchemaViolation::EmptyQuestionText(1)));
    }

    #[test]
    fn feedback_parses_and_requires_text() {
        let ok = parse_feedback_response(
            r#"{"feedback": "Not bad.", "flashcards": [{"front": "Q", "back": "A"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.flashcards.len(), 1);

        let err = parse_feedback_response(r#"{"feedback": "  ", "flashcards": []}"#).unwrap_err();
        assert!(matches!(
            err,
            FeedbackFailure::Schema(SchemaViolation::EmptyFeedback)
        ));
    }

    #[test]
    fn feedback_flashcards_default_to_empty() {
        let ok = parse_feedback_response(r#"{"feedback": "Wake up."}"#).unwrap();
        assert!(ok.flashcards.is_empty());
    }
}
