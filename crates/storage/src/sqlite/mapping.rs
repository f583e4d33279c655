use quiz_core::model::{
    Answer, AnswerId, Question, QuestionId, QuizDifficulty, QuizId, QuizSession, SessionAnswer,
    SessionId, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a sqlx error, promoting unique-constraint violations to `Conflict`.
///
/// The progression contract leans on two unique indexes (open sessions,
/// answered questions); their violations are expected control flow, not
/// connection failures.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            // writes referencing a missing session/question/answer
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn quiz_id_from_str(s: &str) -> Result<QuizId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn question_id_from_str(s: &str) -> Result<QuestionId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn answer_id_from_str(s: &str) -> Result<AnswerId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn session_id_from_str(s: &str) -> Result<SessionId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn user_id_from_str(s: &str) -> Result<UserId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn ord_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid ord: {v}")))
}

pub(crate) fn bool_from_i64(field: &'static str, v: i64) -> Result<bool, StorageError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid {field}: {other}"
        ))),
    }
}

pub(crate) fn parse_difficulty(s: &str) -> Result<QuizDifficulty, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<Answer, StorageError> {
    Ok(Answer::new(
        answer_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        row.try_get("answer").map_err(ser)?,
        ord_from_i64(row.try_get::<i64, _>("ord").map_err(ser)?)?,
        bool_from_i64("is_correct", row.try_get::<i64, _>("is_correct").map_err(ser)?)?,
        row.try_get("explanation").map_err(ser)?,
    ))
}

pub(crate) fn map_question_row(
    row: &sqlx::sqlite::SqliteRow,
    answers: Vec<Answer>,
) -> Result<Question, StorageError> {
    Ok(Question::new(
        question_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        row.try_get("question").map_err(ser)?,
        ord_from_i64(row.try_get::<i64, _>("ord").map_err(ser)?)?,
        answers,
    ))
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizSession, StorageError> {
    let current_question_id = row
        .try_get::<Option<String>, _>("current_question_id")
        .map_err(ser)?
        .map(|s| question_id_from_str(&s))
        .transpose()?;

    let score_i64: i64 = row.try_get("score").map_err(ser)?;
    let score = u32::try_from(score_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid score: {score_i64}")))?;

    Ok(QuizSession::from_persisted(
        session_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        quiz_id_from_str(&row.try_get::<String, _>("quiz_id").map_err(ser)?)?,
        current_question_id,
        score,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("ended_at").map_err(ser)?,
    ))
}

pub(crate) fn map_session_answer_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionAnswer, StorageError> {
    Ok(SessionAnswer::new(
        session_id_from_str(&row.try_get::<String, _>("session_id").map_err(ser)?)?,
        question_id_from_str(&row.try_get::<String, _>("question_id").map_err(ser)?)?,
        answer_id_from_str(&row.try_get::<String, _>("selected_answer_id").map_err(ser)?)?,
        bool_from_i64("is_correct", row.try_get::<i64, _>("is_correct").map_err(ser)?)?,
        row.try_get("answered_at").map_err(ser)?,
    ))
}
