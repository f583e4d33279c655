use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    AnswerId, QuestionId, Quiz, QuizDraft, QuizId, QuizSession, SessionId, UserId,
};
use serde::Serialize;
use storage::repository::{QuizRepository, SessionRepository};
use tracing::error;

use crate::auth::AuthProvider;
use crate::error::{QuizServiceError, SessionFlowError};
use crate::quiz_service::QuizService;
use crate::sessions::{ProgressionController, SessionReport, SubmitOutcome};

//
// ─── ACTION ERROR ──────────────────────────────────────────────────────────────
//

/// Boundary error: a stable machine-readable code plus an HTTP-like status
/// for transport mapping.
///
/// The codes are part of the client contract and never change spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionError {
    pub status: u16,
    pub code: &'static str,
    pub title: &'static str,
    pub message: String,
}

/// Tagged result every operation returns; no other error shape crosses the
/// boundary.
pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            code: "unauthorized",
            title: "Unauthorized",
            message: "You do not have access to this resource.".into(),
        }
    }

    #[must_use]
    pub fn quiz_not_found() -> Self {
        Self {
            status: 404,
            code: "quiz_not_found",
            title: "Quiz Not Found",
            message: "The quiz you are looking for does not exist.".into(),
        }
    }

    #[must_use]
    pub fn quiz_session_not_found() -> Self {
        Self {
            status: 404,
            code: "quiz_session_not_found",
            title: "Quiz Session Not Found",
            message: "The quiz session you are looking for does not exist".into(),
        }
    }

    #[must_use]
    pub fn question_not_found() -> Self {
        Self {
            status: 404,
            code: "question_not_found",
            title: "Question Not Found",
            message: "The quiz question you are looking for does not exist".into(),
        }
    }

    #[must_use]
    pub fn answer_not_found() -> Self {
        Self {
            status: 404,
            code: "answer_not_found",
            title: "Answer Not Found",
            message: "The selected answer does not exist for this question".into(),
        }
    }

    #[must_use]
    pub fn question_already_answered() -> Self {
        Self {
            status: 400,
            code: "question_already_answered",
            title: "Question Already Answered",
            message: "This question has already been answered".into(),
        }
    }

    #[must_use]
    pub fn quiz_session_completed() -> Self {
        Self {
            status: 400,
            code: "quiz_session_completed",
            title: "Quiz Session Completed",
            message: "This quiz session has already been completed".into(),
        }
    }

    #[must_use]
    pub fn end_of_quiz() -> Self {
        Self {
            status: 400,
            code: "end_of_quiz",
            title: "End of Quiz",
            message: "No more questions available for this quiz.".into(),
        }
    }

    #[must_use]
    pub fn validation_error(message: String) -> Self {
        Self {
            status: 400,
            code: "validation_error",
            title: "Invalid Data",
            message,
        }
    }

    #[must_use]
    pub fn internal_server_error() -> Self {
        Self {
            status: 500,
            code: "internal_server_error",
            title: "Internal Server Error",
            message: "Oops! Something went wrong on our side. Please try again.".into(),
        }
    }
}

impl From<SessionFlowError> for ActionError {
    fn from(err: SessionFlowError) -> Self {
        match err {
            SessionFlowError::QuizNotFound => Self::quiz_not_found(),
            SessionFlowError::SessionNotFound => Self::quiz_session_not_found(),
            SessionFlowError::QuestionNotFound => Self::question_not_found(),
            SessionFlowError::AnswerNotFound => Self::answer_not_found(),
            SessionFlowError::AlreadyAnswered => Self::question_already_answered(),
            SessionFlowError::SessionCompleted => Self::quiz_session_completed(),
            SessionFlowError::EndOfQuiz => Self::end_of_quiz(),
            SessionFlowError::Integrity(e) => {
                error!(error = %e, "quiz data integrity violation");
                Self::internal_server_error()
            }
            SessionFlowError::Storage(e) => {
                error!(error = %e, "storage failure");
                Self::internal_server_error()
            }
        }
    }
}

impl From<QuizServiceError> for ActionError {
    fn from(err: QuizServiceError) -> Self {
        match err {
            // field-level detail travels in the message, the code stays fixed
            QuizServiceError::Quiz(e) => Self::validation_error(e.to_string()),
            QuizServiceError::Storage(e) => {
                error!(error = %e, "storage failure");
                Self::internal_server_error()
            }
        }
    }
}

//
// ─── OPERATION SURFACE ─────────────────────────────────────────────────────────
//

/// The transport-agnostic operation surface of the progression engine.
///
/// Each operation authenticates, delegates to the controller, and maps every
/// failure onto the stable `ActionError` codes. Callers never see a raw
/// storage or domain error.
#[derive(Clone)]
pub struct QuizSessionActions {
    auth: Arc<dyn AuthProvider>,
    controller: ProgressionController,
}

impl QuizSessionActions {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            auth,
            controller: ProgressionController::new(clock, quizzes, sessions),
        }
    }

    /// Open a quiz: resume the caller's open session or start a fresh one
    /// pointed at the first question.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `quiz_not_found`, `internal_server_error`.
    pub async fn start_or_resume_session(&self, quiz_id: QuizId) -> ActionResult<QuizSession> {
        let user = self.current_user().await?;
        Ok(self.controller.start_or_resume(user, quiz_id).await?)
    }

    /// Submit an answer; scores it, logs it, and completes the session when
    /// the last question was answered.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `quiz_session_not_found`, `quiz_not_found`,
    /// `question_not_found`, `answer_not_found`, `question_already_answered`,
    /// `quiz_session_completed`, `internal_server_error`.
    pub async fn submit_answer(
        &self,
        quiz_id: QuizId,
        session_id: SessionId,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> ActionResult<SubmitOutcome> {
        let user = self.current_user().await?;
        Ok(self
            .controller
            .submit_answer(user, quiz_id, session_id, question_id, answer_id)
            .await?)
    }

    /// Jump the session pointer to any question of its quiz.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `quiz_session_not_found`, `question_not_found`,
    /// `internal_server_error`.
    pub async fn advance_to(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
    ) -> ActionResult<QuizSession> {
        let user = self.current_user().await?;
        Ok(self
            .controller
            .advance_to(user, session_id, question_id)
            .await?)
    }

    /// Move the session pointer to the next question in order.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `quiz_session_not_found`, `question_not_found`,
    /// `end_of_quiz`, `internal_server_error`.
    pub async fn advance_to_next(
        &self,
        quiz_id: QuizId,
        session_id: SessionId,
    ) -> ActionResult<QuizSession> {
        let user = self.current_user().await?;
        Ok(self
            .controller
            .advance_to_next(user, quiz_id, session_id)
            .await?)
    }

    /// Results summary (percentage, elapsed minutes, per-question review)
    /// plus the full answer log.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `quiz_session_not_found`, `internal_server_error`.
    pub async fn get_results(&self, session_id: SessionId) -> ActionResult<SessionReport> {
        let user = self.current_user().await?;
        Ok(self.controller.results(user, session_id).await?)
    }

    async fn current_user(&self) -> Result<UserId, ActionError> {
        self.auth
            .current_user()
            .await
            .ok_or_else(ActionError::unauthorized)
    }
}

impl std::fmt::Debug for QuizSessionActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSessionActions")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

//
// ─── AUTHORING SURFACE ─────────────────────────────────────────────────────────
//

/// Authoring operations behind the same authentication and error contract.
#[derive(Clone)]
pub struct QuizAuthoringActions {
    auth: Arc<dyn AuthProvider>,
    quizzes: QuizService,
}

impl QuizAuthoringActions {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self {
            auth,
            quizzes: QuizService::new(clock, quizzes),
        }
    }

    /// Validate and persist a new quiz owned by the caller.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `validation_error` (with the violated rule in the
    /// message), `internal_server_error`.
    pub async fn create_quiz(&self, draft: QuizDraft) -> ActionResult<QuizId> {
        let user = self.current_user().await?;
        Ok(self.quizzes.create_quiz(draft, user).await?)
    }

    /// Quizzes the caller has created, newest first.
    ///
    /// # Errors
    ///
    /// `unauthorized`, `internal_server_error`.
    pub async fn my_quizzes(&self) -> ActionResult<Vec<Quiz>> {
        let user = self.current_user().await?;
        Ok(self.quizzes.list_quizzes_by(user).await?)
    }

    async fn current_user(&self) -> Result<UserId, ActionError> {
        self.auth
            .current_user()
            .await
            .ok_or_else(ActionError::unauthorized)
    }
}
