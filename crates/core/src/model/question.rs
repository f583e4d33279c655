use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluateError {
    #[error("selected answer does not belong to this question")]
    AnswerNotFound,

    #[error("question has no answer marked correct")]
    NoCorrectAnswer,
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// One selectable answer of a question.
///
/// The explanation is only meaningful on the answer marked correct; it is
/// surfaced to the user after submission regardless of what they picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    id: AnswerId,
    text: String,
    order: u32,
    is_correct: bool,
    explanation: Option<String>,
}

impl Answer {
    #[must_use]
    pub fn new(
        id: AnswerId,
        text: String,
        order: u32,
        is_correct: bool,
        explanation: Option<String>,
    ) -> Self {
        Self {
            id,
            text,
            order,
            is_correct,
            explanation,
        }
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question of a quiz, owning its ordered answers.
///
/// `order` is the question's 1-based position used for traversal. Answer
/// correctness invariants (exactly one correct answer) are enforced when a
/// quiz is authored, not re-validated on rehydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    order: u32,
    answers: Vec<Answer>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: String, order: u32, mut answers: Vec<Answer>) -> Self {
        answers.sort_by_key(Answer::order);
        Self {
            id,
            text,
            order,
            answers,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, id: AnswerId) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == id)
    }

    /// The answer marked correct, if the stored data carries one.
    #[must_use]
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct)
    }

    /// Scores a selected answer against stored data.
    ///
    /// Correctness comes from the stored flag of the selected answer and the
    /// correct answer is resolved independently, so nothing the client sends
    /// can influence the verdict.
    ///
    /// # Errors
    ///
    /// Returns `EvaluateError::AnswerNotFound` if `selected` does not belong
    /// to this question, `EvaluateError::NoCorrectAnswer` if the stored data
    /// has no answer marked correct.
    pub fn evaluate(&self, selected: AnswerId) -> Result<Evaluation, EvaluateError> {
        let selected = self.answer(selected).ok_or(EvaluateError::AnswerNotFound)?;
        let correct = self
            .correct_answer()
            .ok_or(EvaluateError::NoCorrectAnswer)?;

        Ok(Evaluation {
            is_correct: selected.is_correct,
            explanation: correct.explanation.clone(),
            correct_answer: correct.clone(),
        })
    }
}

/// Outcome of evaluating one submission, derived purely from stored data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub correct_answer: Answer,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
