use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId, QuizId, UserId};
use crate::model::question::{Answer, Question};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Validation failures when authoring a quiz.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz category cannot be empty")]
    EmptyCategory,

    #[error("quiz must have at least one question")]
    NoQuestions,

    #[error("question {order} text cannot be empty")]
    EmptyQuestionText { order: u32 },

    #[error("question order {order} is used more than once")]
    DuplicateQuestionOrder { order: u32 },

    #[error("question order must be >= 1")]
    InvalidQuestionOrder,

    #[error("question {order} must have at least two answers")]
    TooFewAnswers { order: u32 },

    #[error("question {order} has an empty answer")]
    EmptyAnswerText { order: u32 },

    #[error("question {order} has no correct answer")]
    NoCorrectAnswer { order: u32 },

    #[error("question {order} has more than one correct answer")]
    MultipleCorrectAnswers { order: u32 },
}

/// Data-integrity violations found while traversing a persisted quiz.
///
/// Authoring rejects these shapes, so they can only come from externally
/// seeded or corrupted rows. Traversal fails instead of guessing so scoring
/// is never silently wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizIntegrityError {
    #[error("question order {order} appears more than once in quiz")]
    DuplicateOrder { order: u32 },

    #[error("question {order} has no correct answer")]
    NoCorrectAnswer { order: u32 },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDifficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
}

impl QuizDifficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizDifficulty::Beginner => "beginner",
            QuizDifficulty::Easy => "easy",
            QuizDifficulty::Medium => "medium",
            QuizDifficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for QuizDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError(String);

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid difficulty: {}", self.0)
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for QuizDifficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(QuizDifficulty::Beginner),
            "easy" => Ok(QuizDifficulty::Easy),
            "medium" => Ok(QuizDifficulty::Medium),
            "hard" => Ok(QuizDifficulty::Hard),
            other => Err(ParseDifficultyError(other.to_owned())),
        }
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Client-supplied answer shape, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Client-supplied question shape, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub order: u32,
    pub answers: Vec<AnswerDraft>,
}

/// Client-supplied quiz shape, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: QuizDifficulty,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// Validate the draft and mint a quiz aggregate with fresh ids.
    ///
    /// Enforced here, once, at authoring time: non-empty title/category, at
    /// least one question, unique 1-based question orders, two or more
    /// answers per question, exactly one of them correct.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizError` violated, in document order.
    pub fn validate(
        self,
        id: QuizId,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Quiz, QuizError> {
        if self.title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if self.category.trim().is_empty() {
            return Err(QuizError::EmptyCategory);
        }
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let mut seen_orders = Vec::with_capacity(self.questions.len());
        let mut questions = Vec::with_capacity(self.questions.len());

        for draft in self.questions {
            let order = draft.order;
            if order == 0 {
                return Err(QuizError::InvalidQuestionOrder);
            }
            if seen_orders.contains(&order) {
                return Err(QuizError::DuplicateQuestionOrder { order });
            }
            seen_orders.push(order);

            if draft.text.trim().is_empty() {
                return Err(QuizError::EmptyQuestionText { order });
            }
            if draft.answers.len() < 2 {
                return Err(QuizError::TooFewAnswers { order });
            }

            let correct = draft.answers.iter().filter(|a| a.is_correct).count();
            match correct {
                0 => return Err(QuizError::NoCorrectAnswer { order }),
                1 => {}
                _ => return Err(QuizError::MultipleCorrectAnswers { order }),
            }

            let mut answers = Vec::with_capacity(draft.answers.len());
            for (idx, answer) in draft.answers.into_iter().enumerate() {
                if answer.text.trim().is_empty() {
                    return Err(QuizError::EmptyAnswerText { order });
                }
                answers.push(Answer::new(
                    AnswerId::random(),
                    answer.text,
                    u32::try_from(idx + 1).unwrap_or(u32::MAX),
                    answer.is_correct,
                    answer.explanation,
                ));
            }

            questions.push(Question::new(QuestionId::random(), draft.text, order, answers));
        }

        Ok(Quiz::from_parts(
            id,
            self.title,
            self.description,
            self.category,
            self.difficulty,
            created_by,
            now,
            questions,
        ))
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Immutable-per-session quiz aggregate: metadata plus ordered questions.
///
/// Sessions traverse the question sequence by the questions' `order` field;
/// "next" is strictly `order + 1`, so gaps end the quiz early and duplicates
/// are reported as integrity errors rather than resolved arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: Option<String>,
    category: String,
    difficulty: QuizDifficulty,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    questions: Vec<Question>,
}

impl Quiz {
    /// Rehydrate a quiz from persisted storage.
    ///
    /// Authoring invariants (one correct answer, unique orders) are not
    /// re-checked here; traversal and evaluation surface violations lazily.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: QuizId,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: QuizDifficulty,
        created_by: Option<UserId>,
        created_at: DateTime<Utc>,
        questions: Vec<Question>,
    ) -> Self {
        Self::from_parts(
            id,
            title,
            description,
            category,
            difficulty,
            created_by,
            created_at,
            questions,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        id: QuizId,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: QuizDifficulty,
        created_by: Option<UserId>,
        created_at: DateTime<Utc>,
        mut questions: Vec<Question>,
    ) -> Self {
        questions.sort_by_key(Question::order);
        Self {
            id,
            title,
            description,
            category,
            difficulty,
            created_by,
            created_at,
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> QuizDifficulty {
        self.difficulty
    }

    #[must_use]
    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Questions in ascending `order`.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// The first question by order, where new sessions start.
    #[must_use]
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// The question following `question`, strictly `order + 1`.
    ///
    /// `Ok(None)` means `question` is the last one (including when orders
    /// have gaps).
    ///
    /// # Errors
    ///
    /// Returns `QuizIntegrityError::DuplicateOrder` when more than one
    /// question claims the successor order.
    pub fn next_after(&self, question: &Question) -> Result<Option<&Question>, QuizIntegrityError> {
        let Some(target) = question.order().checked_add(1) else {
            return Ok(None);
        };
        let mut found = None;
        for candidate in &self.questions {
            if candidate.order() == target {
                if found.is_some() {
                    return Err(QuizIntegrityError::DuplicateOrder { order: target });
                }
                found = Some(candidate);
            }
        }
        Ok(found)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
