#![forbid(unsafe_code)]

pub mod actions;
pub mod auth;
pub mod error;
pub mod quiz_service;
pub mod sessions;

pub use quiz_core::Clock;

pub use actions::{ActionError, ActionResult, QuizAuthoringActions, QuizSessionActions};
pub use auth::{AuthProvider, FixedAuth, NoAuth};
pub use error::{QuizServiceError, SessionFlowError};
pub use quiz_service::QuizService;
pub use sessions::{ProgressionController, SessionReport, SubmitOutcome};
