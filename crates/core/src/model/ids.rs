use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a Quiz
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuizId(Uuid);

/// Unique identifier for a Question
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(Uuid);

/// Unique identifier for an Answer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnswerId(Uuid);

/// Unique identifier for a quiz session (one attempt at one quiz)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

/// Unique identifier for a User, issued by the authentication collaborator
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

macro_rules! id_impls {
    ($name:ident) => {
        impl $name {
            /// Wraps an existing UUID.
            #[must_use]
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generates a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID value
            #[must_use]
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map($name::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

id_impls!(QuizId);
id_impls!(QuestionId);
id_impls!(AnswerId);
id_impls!(SessionId);
id_impls!(UserId);

/// Error type for parsing an ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_id_display_is_canonical_uuid() {
        let raw = Uuid::parse_str("0a6bdfcb-8ef2-4d0e-a1b8-1f2e64a1d901").unwrap();
        let id = QuizId::new(raw);
        assert_eq!(id.to_string(), "0a6bdfcb-8ef2-4d0e-a1b8-1f2e64a1d901");
    }

    #[test]
    fn session_id_from_str_roundtrip() {
        let original = SessionId::random();
        let parsed: SessionId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn question_id_from_str_invalid() {
        let result = "not-a-uuid".parse::<QuestionId>();
        assert!(result.is_err());
    }

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(AnswerId::random(), AnswerId::random());
    }

    #[test]
    fn debug_includes_type_name() {
        let id = UserId::random();
        assert!(format!("{id:?}").starts_with("UserId("));
    }
}
