use std::collections::HashMap;

use quiz_core::model::{Answer, Quiz, QuizId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_answer_row, map_question_row, parse_difficulty, quiz_id_from_str, ser, user_id_from_str},
};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, description, category, difficulty, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                difficulty = excluded.difficulty
            ",
        )
        .bind(quiz.id().to_string())
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(quiz.category())
        .bind(quiz.difficulty().as_str())
        .bind(quiz.created_by().map(|u| u.to_string()))
        .bind(quiz.created_at())
        .execute(&mut *tx)
        .await
        .map_err(super::mapping::map_sqlx_error)?;

        // Replace the question set wholesale; cascades clear the answers.
        sqlx::query("DELETE FROM questions WHERE quiz_id = ?1")
            .bind(quiz.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for question in quiz.questions() {
            sqlx::query(
                r"
                INSERT INTO questions (id, quiz_id, question, ord)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(question.id().to_string())
            .bind(quiz.id().to_string())
            .bind(question.text())
            .bind(i64::from(question.order()))
            .execute(&mut *tx)
            .await
            .map_err(super::mapping::map_sqlx_error)?;

            for answer in question.answers() {
                sqlx::query(
                    r"
                    INSERT INTO answers (id, question_id, answer, ord, is_correct, explanation)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ",
                )
                .bind(answer.id().to_string())
                .bind(question.id().to_string())
                .bind(answer.text())
                .bind(i64::from(answer.order()))
                .bind(i64::from(answer.is_correct()))
                .bind(answer.explanation())
                .execute(&mut *tx)
                .await
                .map_err(super::mapping::map_sqlx_error)?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let Some(quiz_row) = sqlx::query(
            r"
            SELECT id, title, description, category, difficulty, created_by, created_at
            FROM quizzes
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
            SELECT id, question, ord
            FROM questions
            WHERE quiz_id = ?1
            ORDER BY ord ASC
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let answer_rows = sqlx::query(
            r"
            SELECT a.id, a.question_id, a.answer, a.ord, a.is_correct, a.explanation
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?1
            ORDER BY a.ord ASC
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers_by_question: HashMap<String, Vec<Answer>> = HashMap::new();
        for row in &answer_rows {
            let question_id: String = row.try_get("question_id").map_err(ser)?;
            answers_by_question
                .entry(question_id)
                .or_default()
                .push(map_answer_row(row)?);
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in &question_rows {
            let question_id: String = row.try_get("id").map_err(ser)?;
            let answers = answers_by_question.remove(&question_id).unwrap_or_default();
            questions.push(map_question_row(row, answers)?);
        }

        let created_by = quiz_row
            .try_get::<Option<String>, _>("created_by")
            .map_err(ser)?
            .map(|s| user_id_from_str(&s))
            .transpose()?;

        Ok(Some(Quiz::from_persisted(
            quiz_id_from_str(&quiz_row.try_get::<String, _>("id").map_err(ser)?)?,
            quiz_row.try_get("title").map_err(ser)?,
            quiz_row.try_get("description").map_err(ser)?,
            quiz_row.try_get("category").map_err(ser)?,
            parse_difficulty(&quiz_row.try_get::<String, _>("difficulty").map_err(ser)?)?,
            created_by,
            quiz_row.try_get("created_at").map_err(ser)?,
            questions,
        )))
    }

    async fn list_quizzes_by(&self, user: UserId) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id
            FROM quizzes
            WHERE created_by = ?1
            ORDER BY created_at DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = quiz_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
            if let Some(quiz) = self.get_quiz(id).await? {
                quizzes.push(quiz);
            }
        }
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
