use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    Answer, AnswerId, EvaluateError, Question, QuestionId, Quiz, QuizId, QuizIntegrityError,
    QuizSession, SessionAnswer, SessionId, SessionResults, UserId,
};
use serde::Serialize;
use storage::repository::{QuizRepository, SessionRepository, StorageError};

use crate::error::SessionFlowError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Everything a client needs after submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub session_answer: SessionAnswer,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub correct_answer: Answer,
    pub is_last_question: bool,
    /// `None` exactly when `is_last_question` is true.
    pub next_question_id: Option<QuestionId>,
    pub updated_score: u32,
}

/// Results summary plus the raw answer log for review rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub summary: SessionResults,
    pub answers: Vec<SessionAnswer>,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// State machine over a session's lifecycle: NotStarted → InProgress →
/// Completed.
///
/// All position and score authority lives here and in storage, never in
/// the client. The storage uniqueness constraints close the double-submit and
/// double-start races; this controller translates their `Conflict`s into the
/// flow errors callers can act on.
#[derive(Clone)]
pub struct ProgressionController {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl ProgressionController {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            sessions,
        }
    }

    /// NotStarted → InProgress: resolve the user's open session for the
    /// quiz, creating one positioned at the first question when none exists.
    ///
    /// Idempotent: calling again (including concurrently) yields the same
    /// open session. A stale open session with no position is repaired to
    /// point at the first question.
    ///
    /// # Errors
    ///
    /// `QuizNotFound` when the quiz does not exist; storage errors pass
    /// through.
    pub async fn start_or_resume(
        &self,
        user: UserId,
        quiz_id: QuizId,
    ) -> Result<QuizSession, SessionFlowError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionFlowError::QuizNotFound)?;

        if let Some(existing) = self.sessions.find_open_session(user, quiz_id).await? {
            return self.ensure_position(existing, &quiz).await;
        }

        let session = QuizSession::new(
            SessionId::random(),
            user,
            quiz_id,
            quiz.first_question().map(Question::id),
            self.clock.now(),
        );

        match self.sessions.insert_open_session(&session).await {
            Ok(()) => Ok(session),
            // lost a concurrent start race: reuse the winner's session
            Err(StorageError::Conflict) => {
                let existing = self
                    .sessions
                    .find_open_session(user, quiz_id)
                    .await?
                    .ok_or(SessionFlowError::SessionNotFound)?;
                self.ensure_position(existing, &quiz).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submit an answer for a question of the session's quiz.
    ///
    /// Only valid while InProgress. The answer record, score increment, and
    /// (for the highest-order question) the completion timestamp are written
    /// in one atomic storage step.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` when the session is missing, owned by someone else,
    /// or not a session of `quiz_id`; `SessionCompleted` after completion;
    /// `QuestionNotFound` / `AnswerNotFound` for mismatched targets;
    /// `AlreadyAnswered` on a repeat submission (first write wins).
    pub async fn submit_answer(
        &self,
        user: UserId,
        quiz_id: QuizId,
        session_id: SessionId,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<SubmitOutcome, SessionFlowError> {
        let session = self.owned_session(user, session_id).await?;
        if session.quiz_id() != quiz_id {
            return Err(SessionFlowError::SessionNotFound);
        }
        if !session.is_open() {
            return Err(SessionFlowError::SessionCompleted);
        }

        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionFlowError::QuizNotFound)?;
        let question = quiz
            .question(question_id)
            .ok_or(SessionFlowError::QuestionNotFound)?;

        let evaluation = question.evaluate(answer_id).map_err(|e| match e {
            EvaluateError::AnswerNotFound => SessionFlowError::AnswerNotFound,
            EvaluateError::NoCorrectAnswer => {
                SessionFlowError::Integrity(QuizIntegrityError::NoCorrectAnswer {
                    order: question.order(),
                })
            }
            _ => SessionFlowError::Integrity(QuizIntegrityError::NoCorrectAnswer {
                order: question.order(),
            }),
        })?;

        let next_question = quiz.next_after(question)?;
        let is_last_question = next_question.is_none();

        let now = self.clock.now();
        let record = SessionAnswer::new(
            session_id,
            question_id,
            answer_id,
            evaluation.is_correct,
            now,
        );

        let updated = match self
            .sessions
            .record_submission(
                &record,
                u32::from(evaluation.is_correct),
                is_last_question.then_some(now),
            )
            .await
        {
            Err(StorageError::Conflict) => return Err(SessionFlowError::AlreadyAnswered),
            other => other?,
        };

        Ok(SubmitOutcome {
            session_answer: record,
            is_correct: evaluation.is_correct,
            explanation: evaluation.explanation,
            correct_answer: evaluation.correct_answer,
            is_last_question,
            next_question_id: next_question.map(Question::id),
            updated_score: updated.score(),
        })
    }

    /// Move the session pointer to any question of its quiz: forward,
    /// backward, or a jump from a question picker.
    ///
    /// Allowed on completed sessions too: review replay moves the pointer
    /// but can never touch score or completion.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for missing/foreign sessions; `QuestionNotFound`
    /// when the target belongs to a different quiz.
    pub async fn advance_to(
        &self,
        user: UserId,
        session_id: SessionId,
        question_id: QuestionId,
    ) -> Result<QuizSession, SessionFlowError> {
        let mut session = self.owned_session(user, session_id).await?;

        let quiz = self
            .quizzes
            .get_quiz(session.quiz_id())
            .await?
            .ok_or(SessionFlowError::QuizNotFound)?;
        if quiz.question(question_id).is_none() {
            return Err(SessionFlowError::QuestionNotFound);
        }

        self.sessions
            .set_current_question(session_id, question_id)
            .await?;
        session.set_current_question(question_id);
        Ok(session)
    }

    /// Move the session pointer to the question after the current one
    /// (strictly order + 1).
    ///
    /// # Errors
    ///
    /// `EndOfQuiz` when the current question is the last one;
    /// `QuestionNotFound` when the pointer is unset or dangling.
    pub async fn advance_to_next(
        &self,
        user: UserId,
        quiz_id: QuizId,
        session_id: SessionId,
    ) -> Result<QuizSession, SessionFlowError> {
        let mut session = self.owned_session(user, session_id).await?;
        if session.quiz_id() != quiz_id {
            return Err(SessionFlowError::SessionNotFound);
        }

        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionFlowError::QuizNotFound)?;

        let current = session
            .current_question_id()
            .and_then(|id| quiz.question(id))
            .ok_or(SessionFlowError::QuestionNotFound)?;

        let next = quiz
            .next_after(current)?
            .ok_or(SessionFlowError::EndOfQuiz)?;

        self.sessions
            .set_current_question(session_id, next.id())
            .await?;
        session.set_current_question(next.id());
        Ok(session)
    }

    /// Results summary plus the full answer log for a session.
    ///
    /// Works for open sessions too (elapsed time reads 0, unanswered
    /// questions show as such); completion is not required to peek.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for missing/foreign sessions.
    pub async fn results(
        &self,
        user: UserId,
        session_id: SessionId,
    ) -> Result<SessionReport, SessionFlowError> {
        let session = self.owned_session(user, session_id).await?;

        let quiz = self
            .quizzes
            .get_quiz(session.quiz_id())
            .await?
            .ok_or(SessionFlowError::QuizNotFound)?;
        let answers = self.sessions.answers_for_session(session_id).await?;

        let summary = SessionResults::summarize(&session, &quiz, &answers);
        Ok(SessionReport { summary, answers })
    }

    /// Load a session and verify ownership. A session owned by someone else
    /// reads as missing.
    async fn owned_session(
        &self,
        user: UserId,
        session_id: SessionId,
    ) -> Result<QuizSession, SessionFlowError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(SessionFlowError::SessionNotFound)?;
        if session.user_id() != user {
            return Err(SessionFlowError::SessionNotFound);
        }
        Ok(session)
    }

    /// Point a session with no position at the quiz's first question.
    async fn ensure_position(
        &self,
        mut session: QuizSession,
        quiz: &Quiz,
    ) -> Result<QuizSession, SessionFlowError> {
        if session.current_question_id().is_none() {
            if let Some(first) = quiz.first_question() {
                self.sessions
                    .set_current_question(session.id(), first.id())
                    .await?;
                session.set_current_question(first.id());
            }
        }
        Ok(session)
    }
}

impl std::fmt::Debug for ProgressionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionController")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
