mod controller;

// Public API of the session subsystem.
pub use crate::error::SessionFlowError;
pub use controller::{ProgressionController, SessionReport, SubmitOutcome};
