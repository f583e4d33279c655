use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AnswerId, QuestionId, QuizId, SessionId, UserId};

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// One user's single attempt at one quiz.
///
/// Open while `ended_at` is `None`; `ended_at` is set exactly once, when the
/// highest-order question is answered, and never reverts. At most one open
/// session exists per (user, quiz); the storage layer enforces this with a
/// uniqueness constraint and the controller reuses the open session instead
/// of creating a second one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    id: SessionId,
    user_id: UserId,
    quiz_id: QuizId,
    current_question_id: Option<QuestionId>,
    score: u32,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// A fresh open session positioned at `current_question_id` (the quiz's
    /// first question, or `None` for a question-less quiz).
    #[must_use]
    pub fn new(
        id: SessionId,
        user_id: UserId,
        quiz_id: QuizId,
        current_question_id: Option<QuestionId>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            quiz_id,
            current_question_id,
            score: 0,
            started_at,
            ended_at: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    #[must_use]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        quiz_id: QuizId,
        current_question_id: Option<QuestionId>,
        score: u32,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            quiz_id,
            current_question_id,
            score,
            started_at,
            ended_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        self.current_question_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Move the navigation pointer. Pure position change; score and
    /// completion are untouched, which is what makes post-completion review
    /// replay safe.
    pub fn set_current_question(&mut self, question_id: QuestionId) {
        self.current_question_id = Some(question_id);
    }

    /// Fold one recorded submission into the session: bump the score iff
    /// correct, and close the session when `ended_at` is provided. An
    /// already-set end timestamp is kept.
    pub fn apply_submission(&mut self, is_correct: bool, ended_at: Option<DateTime<Utc>>) {
        if is_correct {
            self.score += 1;
        }
        if self.ended_at.is_none() {
            self.ended_at = ended_at;
        }
    }
}

//
// ─── SESSION ANSWER ────────────────────────────────────────────────────────────
//

/// Durable log entry for one submission: which answer was picked for which
/// question, and whether it was correct at the time.
///
/// At most one record exists per (session, question); storage enforces the
/// uniqueness, and records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAnswer {
    session_id: SessionId,
    question_id: QuestionId,
    selected_answer_id: AnswerId,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

impl SessionAnswer {
    #[must_use]
    pub fn new(
        session_id: SessionId,
        question_id: QuestionId,
        selected_answer_id: AnswerId,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            question_id,
            selected_answer_id,
            is_correct,
            answered_at,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_answer_id(&self) -> AnswerId {
        self.selected_answer_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn answered_at(&self) -> DateTime<Utc> {
        self.answered_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn open_session() -> QuizSession {
        QuizSession::new(
            SessionId::random(),
            UserId::random(),
            QuizId::random(),
            Some(QuestionId::random()),
            fixed_now(),
        )
    }

    #[test]
    fn new_session_is_open_with_zero_score() {
        let session = open_session();
        assert!(session.is_open());
        assert_eq!(session.score(), 0);
        assert!(session.ended_at().is_none());
    }

    #[test]
    fn score_only_increments_on_correct_submissions() {
        let mut session = open_session();
        session.apply_submission(true, None);
        session.apply_submission(false, None);
        session.apply_submission(true, None);
        assert_eq!(session.score(), 2);
        assert!(session.is_open());
    }

    #[test]
    fn ended_at_is_set_exactly_once() {
        let mut session = open_session();
        let first_end = fixed_now() + Duration::minutes(3);
        session.apply_submission(true, Some(first_end));
        assert_eq!(session.ended_at(), Some(first_end));
        assert!(!session.is_open());

        // a later submission attempt can never move the end timestamp
        session.apply_submission(true, Some(first_end + Duration::minutes(10)));
        assert_eq!(session.ended_at(), Some(first_end));
    }

    #[test]
    fn navigation_does_not_touch_score_or_completion() {
        let mut session = open_session();
        session.apply_submission(true, Some(fixed_now()));
        let target = QuestionId::random();
        session.set_current_question(target);

        assert_eq!(session.current_question_id(), Some(target));
        assert_eq!(session.score(), 1);
        assert!(!session.is_open());
    }
}
