use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the quiz aggregate tables (quizzes, questions, answers), the
/// session tables, and the uniqueness constraints the progression contract
/// relies on:
/// - `questions(quiz_id, ord)` unique: duplicate order values are rejected
///   at write time;
/// - `answers(question_id, answer)` unique: no repeated answer text within
///   a question;
/// - one open session per (user_id, quiz_id) via a partial unique index;
/// - one answer per (session_id, question_id) via the primary key.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quizzes (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    category TEXT NOT NULL,
                    difficulty TEXT NOT NULL,
                    created_by TEXT,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id TEXT PRIMARY KEY,
                    quiz_id TEXT NOT NULL,
                    question TEXT NOT NULL,
                    ord INTEGER NOT NULL CHECK (ord >= 1),
                    UNIQUE (quiz_id, ord),
                    FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS answers (
                    id TEXT PRIMARY KEY,
                    question_id TEXT NOT NULL,
                    answer TEXT NOT NULL,
                    ord INTEGER NOT NULL CHECK (ord >= 1),
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    explanation TEXT,
                    UNIQUE (question_id, answer),
                    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_sessions (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    quiz_id TEXT NOT NULL,
                    current_question_id TEXT,
                    score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0),
                    started_at TEXT NOT NULL,
                    ended_at TEXT,
                    FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE,
                    FOREIGN KEY (current_question_id) REFERENCES questions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_answers (
                    session_id TEXT NOT NULL,
                    question_id TEXT NOT NULL,
                    selected_answer_id TEXT NOT NULL,
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    answered_at TEXT NOT NULL,
                    PRIMARY KEY (session_id, question_id),
                    FOREIGN KEY (session_id) REFERENCES quiz_sessions(id) ON DELETE CASCADE,
                    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                    FOREIGN KEY (selected_answer_id) REFERENCES answers(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_quiz_sessions_one_open
                    ON quiz_sessions (user_id, quiz_id)
                    WHERE ended_at IS NULL;
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_quiz_ord
                    ON questions (quiz_id, ord);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quizzes_created_by
                    ON quizzes (created_by, created_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_answers_answered_at
                    ON session_answers (session_id, answered_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
