use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Quiz, QuizId, QuizSession, SessionAnswer, SessionId, QuestionId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for quiz aggregates.
///
/// `get_quiz` returns the full aggregate: questions in ascending order, each
/// with its answers. Quizzes are immutable once sessions run against them;
/// `upsert_quiz` exists for authoring and seeding.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist or replace a quiz aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz with its ordered questions and answers.
    ///
    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List quizzes created by the given user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_quizzes_by(&self, user: UserId) -> Result<Vec<Quiz>, StorageError>;

    /// Delete a quiz; questions, answers, sessions, and session answers go
    /// with it (cascade).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;
}

/// Repository contract for quiz sessions and their answer log.
///
/// Two invariants live *here*, not in application code, so concurrent
/// requests cannot race past them:
/// - at most one open session per (user, quiz): `insert_open_session`
///   fails with `Conflict` when one exists;
/// - at most one answer per (session, question): `record_submission`
///   fails with `Conflict` on a duplicate and changes nothing.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a fresh open session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the (user, quiz) pair already
    /// has an open session.
    async fn insert_open_session(&self, session: &QuizSession) -> Result<(), StorageError>;

    /// Fetch a session by id. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError>;

    /// The open (not yet ended) session of a user for a quiz, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn find_open_session(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Option<QuizSession>, StorageError>;

    /// Navigation-only mutation: move the session's current-question pointer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the session does not exist.
    async fn set_current_question(
        &self,
        id: SessionId,
        question: QuestionId,
    ) -> Result<(), StorageError>;

    /// Append one answer to the session log and fold it into the session in
    /// a single atomic step: insert the record, add `score_delta` to the
    /// stored score, and set `ended_at` when provided (an already-ended
    /// session keeps its original end timestamp).
    ///
    /// Returns the updated session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the (session, question) pair
    /// was already answered; nothing is written in that case.
    /// Returns `StorageError::NotFound` when the session does not exist.
    async fn record_submission(
        &self,
        answer: &SessionAnswer,
        score_delta: u32,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<QuizSession, StorageError>;

    /// The session's answer log in submission order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn answers_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<SessionAnswer>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// The mutex serializes all mutations, so the Conflict checks below are
/// atomic in the same sense as the SQLite uniqueness constraints.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    sessions: Arc<Mutex<HashMap<SessionId, QuizSession>>>,
    answers: Arc<Mutex<Vec<SessionAnswer>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        mutex
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.quizzes)?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_quizzes_by(&self, user: UserId) -> Result<Vec<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        let mut found: Vec<Quiz> = guard
            .values()
            .filter(|q| q.created_by() == Some(user))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(found)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut quizzes = Self::lock(&self.quizzes)?;
        if quizzes.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }

        // cascade: sessions for the quiz, and their answers
        let mut sessions = Self::lock(&self.sessions)?;
        let doomed: Vec<SessionId> = sessions
            .values()
            .filter(|s| s.quiz_id() == id)
            .map(QuizSession::id)
            .collect();
        sessions.retain(|_, s| s.quiz_id() != id);

        let mut answers = Self::lock(&self.answers)?;
        answers.retain(|a| !doomed.contains(&a.session_id()));
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_open_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.sessions)?;
        let open_exists = guard.values().any(|s| {
            s.user_id() == session.user_id() && s.quiz_id() == session.quiz_id() && s.is_open()
        });
        if open_exists {
            return Err(StorageError::Conflict);
        }
        guard.insert(session.id(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let guard = Self::lock(&self.sessions)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_open_session(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Option<QuizSession>, StorageError> {
        let guard = Self::lock(&self.sessions)?;
        Ok(guard
            .values()
            .find(|s| s.user_id() == user && s.quiz_id() == quiz && s.is_open())
            .cloned())
    }

    async fn set_current_question(
        &self,
        id: SessionId,
        question: QuestionId,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.sessions)?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        session.set_current_question(question);
        Ok(())
    }

    async fn record_submission(
        &self,
        answer: &SessionAnswer,
        score_delta: u32,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<QuizSession, StorageError> {
        let mut sessions = Self::lock(&self.sessions)?;
        let mut answers = Self::lock(&self.answers)?;

        let session = sessions
            .get_mut(&answer.session_id())
            .ok_or(StorageError::NotFound)?;

        let already_answered = answers.iter().any(|a| {
            a.session_id() == answer.session_id() && a.question_id() == answer.question_id()
        });
        if already_answered {
            return Err(StorageError::Conflict);
        }

        answers.push(answer.clone());
        session.apply_submission(score_delta > 0, ended_at);
        Ok(session.clone())
    }

    async fn answers_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<SessionAnswer>, StorageError> {
        let guard = Self::lock(&self.answers)?;
        Ok(guard
            .iter()
            .filter(|a| a.session_id() == id)
            .cloned()
            .collect())
    }
}

/// Aggregates quiz and session repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo);
        Self { quizzes, sessions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{
        AnswerDraft, QuestionDraft, QuizDifficulty, QuizDraft, SessionAnswer,
    };
    use quiz_core::time::fixed_now;
    use chrono::Duration;

    fn build_quiz(creator: Option<UserId>) -> Quiz {
        QuizDraft {
            title: "Flags".into(),
            description: Some("flag trivia".into()),
            category: "geography".into(),
            difficulty: QuizDifficulty::Easy,
            questions: (1..=2)
                .map(|order| QuestionDraft {
                    text: format!("Q{order}"),
                    order,
                    answers: vec![
                        AnswerDraft {
                            text: "right".into(),
                            is_correct: true,
                            explanation: None,
                        },
                        AnswerDraft {
                            text: "wrong".into(),
                            is_correct: false,
                            explanation: None,
                        },
                    ],
                })
                .collect(),
        }
        .validate(QuizId::random(), creator, fixed_now())
        .unwrap()
    }

    fn open_session(quiz: &Quiz, user: UserId) -> QuizSession {
        QuizSession::new(
            SessionId::random(),
            user,
            quiz.id(),
            quiz.first_question().map(quiz_core::model::Question::id),
            fixed_now(),
        )
    }

    #[tokio::test]
    async fn quiz_roundtrip_preserves_aggregate() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(None);
        repo.upsert_quiz(&quiz).await.unwrap();

        let fetched = repo.get_quiz(quiz.id()).await.unwrap().unwrap();
        assert_eq!(fetched, quiz);
        assert!(repo.get_quiz(QuizId::random()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_open_session_for_same_pair_conflicts() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(None);
        let user = UserId::random();
        repo.upsert_quiz(&quiz).await.unwrap();

        repo.insert_open_session(&open_session(&quiz, user))
            .await
            .unwrap();
        let err = repo
            .insert_open_session(&open_session(&quiz, user))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        // a different user is unaffected
        repo.insert_open_session(&open_session(&quiz, UserId::random()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_submission_conflicts_and_keeps_score() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(None);
        let user = UserId::random();
        let session = open_session(&quiz, user);
        repo.upsert_quiz(&quiz).await.unwrap();
        repo.insert_open_session(&session).await.unwrap();

        let question = quiz.first_question().unwrap();
        let picked = question.correct_answer().unwrap();
        let record = SessionAnswer::new(
            session.id(),
            question.id(),
            picked.id(),
            true,
            fixed_now(),
        );

        let updated = repo.record_submission(&record, 1, None).await.unwrap();
        assert_eq!(updated.score(), 1);

        let err = repo.record_submission(&record, 1, None).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let current = repo.get_session(session.id()).await.unwrap().unwrap();
        assert_eq!(current.score(), 1);
        assert_eq!(repo.answers_for_session(session.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ending_a_session_frees_the_open_slot() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(None);
        let user = UserId::random();
        let session = open_session(&quiz, user);
        repo.upsert_quiz(&quiz).await.unwrap();
        repo.insert_open_session(&session).await.unwrap();

        let question = quiz.first_question().unwrap();
        let record = SessionAnswer::new(
            session.id(),
            question.id(),
            question.correct_answer().unwrap().id(),
            true,
            fixed_now(),
        );
        repo.record_submission(&record, 1, Some(fixed_now() + Duration::minutes(1)))
            .await
            .unwrap();

        assert!(repo
            .find_open_session(user, quiz.id())
            .await
            .unwrap()
            .is_none());
        repo.insert_open_session(&open_session(&quiz, user))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cascade_delete_removes_sessions_and_answers() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(None);
        let session = open_session(&quiz, UserId::random());
        repo.upsert_quiz(&quiz).await.unwrap();
        repo.insert_open_session(&session).await.unwrap();

        let question = quiz.first_question().unwrap();
        let record = SessionAnswer::new(
            session.id(),
            question.id(),
            question.correct_answer().unwrap().id(),
            true,
            fixed_now(),
        );
        repo.record_submission(&record, 1, None).await.unwrap();

        repo.delete_quiz(quiz.id()).await.unwrap();
        assert!(repo.get_session(session.id()).await.unwrap().is_none());
        assert!(repo
            .answers_for_session(session.id())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_quizzes_by_filters_on_creator() {
        let repo = InMemoryRepository::new();
        let creator = UserId::random();
        let mine = build_quiz(Some(creator));
        let theirs = build_quiz(Some(UserId::random()));
        repo.upsert_quiz(&mine).await.unwrap();
        repo.upsert_quiz(&theirs).await.unwrap();

        let listed = repo.list_quizzes_by(creator).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), mine.id());
    }
}
