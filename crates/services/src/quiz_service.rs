use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Quiz, QuizDraft, QuizId, UserId};
use storage::repository::QuizRepository;

use crate::error::QuizServiceError;

/// Orchestrates quiz authoring and reads.
///
/// Authoring validation happens in the domain (`QuizDraft::validate`):
/// duplicate question orders, missing/multiple correct answers, and empty
/// content never reach storage.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { clock, quizzes }
    }

    /// Validate a draft and persist the resulting quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for validation failures.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(
        &self,
        draft: QuizDraft,
        created_by: UserId,
    ) -> Result<QuizId, QuizServiceError> {
        let now = self.clock.now();
        let quiz = draft.validate(QuizId::random(), Some(created_by), now)?;
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(quiz.id())
    }

    /// Fetch a quiz aggregate by ID.
    ///
    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, QuizServiceError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        Ok(quiz)
    }

    /// List quizzes created by the given user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes_by(&self, user: UserId) -> Result<Vec<Quiz>, QuizServiceError> {
        let quizzes = self.quizzes.list_quizzes_by(user).await?;
        Ok(quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerDraft, QuestionDraft, QuizDifficulty, QuizError};
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> QuizService {
        QuizService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    fn valid_draft() -> QuizDraft {
        QuizDraft {
            title: "Rust basics".into(),
            description: None,
            category: "programming".into(),
            difficulty: QuizDifficulty::Beginner,
            questions: vec![QuestionDraft {
                text: "Who checks borrows?".into(),
                order: 1,
                answers: vec![
                    AnswerDraft {
                        text: "the borrow checker".into(),
                        is_correct: true,
                        explanation: Some("compile-time ownership analysis".into()),
                    },
                    AnswerDraft {
                        text: "the garbage collector".into(),
                        is_correct: false,
                        explanation: None,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let service = service();
        let creator = UserId::random();

        let quiz_id = service.create_quiz(valid_draft(), creator).await.unwrap();
        let quiz = service.get_quiz(quiz_id).await.unwrap().unwrap();

        assert_eq!(quiz.title(), "Rust basics");
        assert_eq!(quiz.created_by(), Some(creator));
        assert_eq!(quiz.question_count(), 1);

        let listed = service.list_quizzes_by(creator).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_storage() {
        let service = service();
        let mut draft = valid_draft();
        draft.questions.push(draft.questions[0].clone()); // duplicate order 1

        let err = service
            .create_quiz(draft, UserId::random())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Quiz(QuizError::DuplicateQuestionOrder { order: 1 })
        ));

        let listed = service.list_quizzes_by(UserId::random()).await.unwrap();
        assert!(listed.is_empty());
    }
}
