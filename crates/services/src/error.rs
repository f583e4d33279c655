//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, QuizIntegrityError};
use storage::repository::StorageError;

/// Errors emitted by the progression controller.
///
/// A closed taxonomy: every session operation resolves to one of these, and
/// the operation surface maps each variant onto a stable wire code. Absent
/// *and* not-owned both collapse into the NotFound variants so existence is
/// never leaked across users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionFlowError {
    #[error("quiz not found")]
    QuizNotFound,

    #[error("quiz session not found")]
    SessionNotFound,

    #[error("question does not belong to the session's quiz")]
    QuestionNotFound,

    #[error("selected answer does not belong to the question")]
    AnswerNotFound,

    #[error("question already answered in this session")]
    AlreadyAnswered,

    #[error("quiz session is already completed")]
    SessionCompleted,

    #[error("no next question: end of quiz")]
    EndOfQuiz,

    #[error(transparent)]
    Integrity(#[from] QuizIntegrityError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
