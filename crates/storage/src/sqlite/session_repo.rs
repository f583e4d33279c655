use chrono::{DateTime, Utc};
use quiz_core::model::{QuestionId, QuizId, QuizSession, SessionAnswer, SessionId, UserId};

use super::{
    SqliteRepository,
    mapping::{map_session_answer_row, map_session_row, map_sqlx_error},
};
use crate::repository::{SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_open_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        // idx_quiz_sessions_one_open turns a concurrent duplicate into a
        // unique violation here, mapped to Conflict.
        sqlx::query(
            r"
            INSERT INTO quiz_sessions (id, user_id, quiz_id, current_question_id, score, started_at, ended_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(session.id().to_string())
        .bind(session.user_id().to_string())
        .bind(session.quiz_id().to_string())
        .bind(session.current_question_id().map(|q| q.to_string()))
        .bind(i64::from(session.score()))
        .bind(session.started_at())
        .bind(session.ended_at())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, quiz_id, current_question_id, score, started_at, ended_at
            FROM quiz_sessions
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn find_open_session(
        &self,
        user: UserId,
        quiz: QuizId,
    ) -> Result<Option<QuizSession>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, quiz_id, current_question_id, score, started_at, ended_at
            FROM quiz_sessions
            WHERE user_id = ?1 AND quiz_id = ?2 AND ended_at IS NULL
            ",
        )
        .bind(user.to_string())
        .bind(quiz.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn set_current_question(
        &self,
        id: SessionId,
        question: QuestionId,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            UPDATE quiz_sessions
            SET current_question_id = ?2
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(question.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn record_submission(
        &self,
        answer: &SessionAnswer,
        score_delta: u32,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<QuizSession, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // The (session_id, question_id) primary key makes a double submit a
        // unique violation; the transaction rolls back with nothing written.
        sqlx::query(
            r"
            INSERT INTO session_answers (session_id, question_id, selected_answer_id, is_correct, answered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(answer.session_id().to_string())
        .bind(answer.question_id().to_string())
        .bind(answer.selected_answer_id().to_string())
        .bind(i64::from(answer.is_correct()))
        .bind(answer.answered_at())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        // score increments in-database (no read-modify-write race) and
        // COALESCE keeps an already-set end timestamp.
        let result = sqlx::query(
            r"
            UPDATE quiz_sessions
            SET score = score + ?2,
                ended_at = COALESCE(ended_at, ?3)
            WHERE id = ?1
            ",
        )
        .bind(answer.session_id().to_string())
        .bind(i64::from(score_delta))
        .bind(ended_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let row = sqlx::query(
            r"
            SELECT id, user_id, quiz_id, current_question_id, score, started_at, ended_at
            FROM quiz_sessions
            WHERE id = ?1
            ",
        )
        .bind(answer.session_id().to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = map_session_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(session)
    }

    async fn answers_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<SessionAnswer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session_id, question_id, selected_answer_id, is_correct, answered_at
            FROM session_answers
            WHERE session_id = ?1
            ORDER BY answered_at ASC, question_id ASC
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in &rows {
            answers.push(map_session_answer_row(row)?);
        }
        Ok(answers)
    }
}
