pub mod bank;
pub mod custom;

pub use bank::{Question, QuestionBank, QuizDefinition};
pub use custom::{CUSTOM_QUIZZES_KEY, CustomQuizzes};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Minimum percentage to pass a module quiz
pub const PASSING_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizOutcome {
    /// Percentage at full precision
    pub score: f64,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
}

impl QuizOutcome {
    /// Score rounded to one decimal for display.
    pub fn display_score(&self) -> f64 {
        (self.score * 10.0).round() / 10.0
    }
}

/// Percentage of questions whose answer equals the correct option.
/// An empty question set scores 0.
pub fn score(questions: &[Question], answers: &BTreeMap<String, String>) -> (usize, f64) {
    if questions.is_empty() {
        return (0, 0.0);
    }
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_answer))
        .count();
    (correct, correct as f64 * 100.0 / questions.len() as f64)
}

pub fn grade(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
    passing_score: f64,
) -> QuizOutcome {
    let (correct, score) = score(questions, answers);
    QuizOutcome {
        score,
        correct,
        total: questions.len(),
        passed: !questions.is_empty() && score >= passing_score,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    InProgress,
    Graded(QuizOutcome),
}

/// One sitting of a module quiz. Not persisted.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    pub workshop_id: String,
    pub module: u32,
    quiz: QuizDefinition,
    answers: BTreeMap<String, String>,
    state: AttemptState,
}

impl QuizAttempt {
    pub fn new(workshop_id: &str, module: u32, quiz: QuizDefinition) -> Self {
        Self {
            workshop_id: workshop_id.to_string(),
            module,
            quiz,
            answers: BTreeMap::new(),
            state: AttemptState::InProgress,
        }
    }

    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    /// Record or change the selected option of a question.
    pub fn answer(&mut self, question_id: &str, option: &str) -> Result<()> {
        if matches!(self.state, AttemptState::Graded(_)) {
            return Err(Error::AttemptGraded);
        }
        let question = self
            .quiz
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| Error::UnknownQuestion(question_id.to_string()))?;
        if !question.has_option(option) {
            return Err(Error::InvalidOption {
                question_id: question_id.to_string(),
                option: option.to_string(),
            });
        }
        self.answers
            .insert(question_id.to_string(), option.to_string());
        Ok(())
    }

    pub fn unanswered(&self) -> Vec<String> {
        self.quiz
            .questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        self.state == AttemptState::InProgress && self.unanswered().is_empty()
    }

    /// Grade the attempt. Every question must have an answer.
    pub fn submit(&mut self, passing_score: f64) -> Result<QuizOutcome> {
        if let AttemptState::Graded(outcome) = self.state {
            return Ok(outcome);
        }
        let unanswered = self.unanswered();
        if !unanswered.is_empty() {
            return Err(Error::IncompleteSubmission { unanswered });
        }
        let outcome = grade(&self.quiz.questions, &self.answers, passing_score);
        debug!(
            "graded {} module {}: {}/{} ({:.1}%)",
            self.workshop_id, self.module, outcome.correct, outcome.total, outcome.score
        );
        self.state = AttemptState::Graded(outcome);
        Ok(outcome)
    }

    /// Start over with no answers.
    pub fn retry(&mut self) {
        self.answers.clear();
        self.state = AttemptState::InProgress;
    }
}
