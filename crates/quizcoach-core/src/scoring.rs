//! Quiz scoring.
//!
//! Pure functions over a quiz and the recorded answers. A question counts as
//! correct only when its recorded answer equals the key; anything else,
//! including no answer at all, is a wrong answer.

use serde::Serialize;

use crate::model::{QuizData, UserAnswers, WrongAnswer};

/// The result of scoring one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreOutcome {
    pub score: usize,
    pub total: usize,
    /// Missed questions in presentation order.
    pub wrong_answers: Vec<WrongAnswer>,
}

/// Coarse grading used when presenting the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    /// Below 50%.
    Low,
    /// 50% up to (not including) 80%.
    Medium,
    High,
}

impl ScoreOutcome {
    /// A win is strictly more than half the questions right.
    pub fn is_win(&self) -> bool {
        self.score * 2 > self.total
    }

    /// Rounded percentage of correct answers.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.score as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn band(&self) -> ScoreBand {
        match self.percentage() {
            p if p < 50 => ScoreBand::Low,
            p if p < 80 => ScoreBand::Medium,
            _ => ScoreBand::High,
        }
    }

    /// Questions that ran out of time without an answer.
    pub fn unanswered(&self) -> usize {
        self.wrong_answers
            .iter()
            .filter(|w| w.selected.is_none())
            .count()
    }
}

/// Score a completed or partially completed quiz.
pub fn score_quiz(quiz: &QuizData, answers: &UserAnswers) -> ScoreOutcome {
    let mut score = 0;
    let mut wrong_answers = Vec::new();

    for question in quiz.questions() {
        match answers.get(question.id) {
            Some(selected) if selected == question.correct => score += 1,
            selected => wrong_answers.push(WrongAnswer {
                question: question.clone(),
                selected,
            }),
        }
    }

    ScoreOutcome {
        score,
        total: quiz.len(),
        wrong_answers,
    }
}
