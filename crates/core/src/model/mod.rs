mod ids;
mod question;
mod quiz;
mod results;
mod session;

pub use ids::{AnswerId, ParseIdError, QuestionId, QuizId, SessionId, UserId};

pub use question::{Answer, EvaluateError, Evaluation, Question};
pub use quiz::{
    AnswerDraft, ParseDifficultyError, QuestionDraft, Quiz, QuizDifficulty, QuizDraft, QuizError,
    QuizIntegrityError,
};
pub use results::{QuestionReview, SessionResults};
pub use session::{QuizSession, SessionAnswer};
