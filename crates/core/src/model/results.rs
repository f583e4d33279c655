use serde::Serialize;

use crate::model::ids::QuestionId;
use crate::model::quiz::Quiz;
use crate::model::session::{QuizSession, SessionAnswer};

//
// ─── PER-QUESTION REVIEW ───────────────────────────────────────────────────────
//

/// Review line for one question of a finished (or abandoned) attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub question_text: String,
    pub answered: bool,
    /// Text of the answer the user picked; `None` when unanswered.
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    /// Resolved from stored data; `None` only for corrupt rows with no
    /// correct answer.
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

//
// ─── SESSION RESULTS ───────────────────────────────────────────────────────────
//

/// Final summary of a session: percentage score, elapsed time, and one
/// review entry per question in quiz order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResults {
    pub score: u32,
    pub total_questions: u32,
    /// `round(score / total * 100)`; 0 when the quiz has no questions.
    pub score_percentage: u32,
    /// Whole minutes between start and end, rounded; 0 while the session is
    /// still open.
    pub elapsed_minutes: i64,
    pub review: Vec<QuestionReview>,
}

impl SessionResults {
    /// Aggregate a session's answer log against its quiz.
    ///
    /// Pure function of its inputs; questions the log does not cover come
    /// back as unanswered review entries.
    #[must_use]
    pub fn summarize(session: &QuizSession, quiz: &Quiz, answers: &[SessionAnswer]) -> Self {
        let total = u32::try_from(quiz.question_count()).unwrap_or(u32::MAX);
        let score = session.score();

        let score_percentage = if total == 0 {
            0
        } else {
            percentage(score, total)
        };

        let elapsed_minutes = session
            .ended_at()
            .map(|ended| round_minutes(ended - session.started_at()))
            .unwrap_or(0);

        let review = quiz
            .questions()
            .iter()
            .map(|question| {
                let logged = answers.iter().find(|a| a.question_id() == question.id());
                let selected = logged.and_then(|a| {
                    question
                        .answer(a.selected_answer_id())
                        .map(|answer| answer.text().to_owned())
                });
                let correct = question.correct_answer();

                QuestionReview {
                    question_id: question.id(),
                    question_text: question.text().to_owned(),
                    answered: logged.is_some(),
                    selected_answer: selected,
                    is_correct: logged.is_some_and(SessionAnswer::is_correct),
                    correct_answer: correct.map(|a| a.text().to_owned()),
                    explanation: correct.and_then(|a| a.explanation().map(str::to_owned)),
                }
            })
            .collect();

        Self {
            score,
            total_questions: total,
            score_percentage,
            elapsed_minutes,
            review,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(score: u32, total: u32) -> u32 {
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}

#[allow(clippy::cast_possible_truncation)]
fn round_minutes(elapsed: chrono::Duration) -> i64 {
    #[allow(clippy::cast_precision_loss)]
    let minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
    minutes.round() as i64
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnswerDraft, QuestionDraft, QuizDifficulty, QuizDraft, QuizId, SessionId, UserId,
    };
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_quiz(question_orders: &[u32]) -> Quiz {
        let questions = question_orders
            .iter()
            .map(|&order| QuestionDraft {
                text: format!("Q{order}"),
                order,
                answers: vec![
                    AnswerDraft {
                        text: format!("right {order}"),
                        is_correct: true,
                        explanation: Some(format!("because {order}")),
                    },
                    AnswerDraft {
                        text: format!("wrong {order}"),
                        is_correct: false,
                        explanation: None,
                    },
                ],
            })
            .collect();

        QuizDraft {
            title: "T".into(),
            description: None,
            category: "general".into(),
            difficulty: QuizDifficulty::Medium,
            questions,
        }
        .validate(QuizId::random(), None, fixed_now())
        .unwrap()
    }

    fn answer_log(
        session: &QuizSession,
        quiz: &Quiz,
        picks: &[(u32, bool)],
    ) -> Vec<SessionAnswer> {
        picks
            .iter()
            .map(|&(order, correctly)| {
                let question = quiz
                    .questions()
                    .iter()
                    .find(|q| q.order() == order)
                    .unwrap();
                let answer = question
                    .answers()
                    .iter()
                    .find(|a| a.is_correct() == correctly)
                    .unwrap();
                SessionAnswer::new(
                    session.id(),
                    question.id(),
                    answer.id(),
                    correctly,
                    fixed_now(),
                )
            })
            .collect()
    }

    fn finished_session(quiz: &Quiz, score: u32, minutes: i64) -> QuizSession {
        let mut session = QuizSession::new(
            SessionId::random(),
            UserId::random(),
            quiz.id(),
            quiz.first_question().map(crate::model::Question::id),
            fixed_now(),
        );
        for _ in 0..score {
            session.apply_submission(true, None);
        }
        session.apply_submission(false, Some(fixed_now() + Duration::minutes(minutes)));
        session
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let quiz = build_quiz(&[1, 2, 3]);
        let session = finished_session(&quiz, 2, 5);
        let answers = answer_log(&session, &quiz, &[(1, true), (2, false), (3, true)]);

        let results = SessionResults::summarize(&session, &quiz, &answers);
        assert_eq!(results.score_percentage, 67);
        assert_eq!(results.total_questions, 3);
        assert_eq!(results.elapsed_minutes, 5);
    }

    #[test]
    fn all_correct_is_100_with_full_review() {
        let quiz = build_quiz(&[1, 2, 3, 4]);
        let mut session = QuizSession::new(
            SessionId::random(),
            UserId::random(),
            quiz.id(),
            None,
            fixed_now(),
        );
        for _ in 0..3 {
            session.apply_submission(true, None);
        }
        session.apply_submission(true, Some(fixed_now() + Duration::minutes(2)));
        let answers = answer_log(
            &session,
            &quiz,
            &[(1, true), (2, true), (3, true), (4, true)],
        );

        let results = SessionResults::summarize(&session, &quiz, &answers);
        assert_eq!(results.score_percentage, 100);
        assert_eq!(results.review.len(), 4);
        assert!(results.review.iter().all(|r| r.is_correct && r.answered));
    }

    #[test]
    fn empty_quiz_reports_zero_percent() {
        let quiz = build_quiz(&[1]);
        let empty = Quiz::from_persisted(
            QuizId::random(),
            "empty".into(),
            None,
            "general".into(),
            QuizDifficulty::Easy,
            None,
            fixed_now(),
            Vec::new(),
        );
        let session = finished_session(&quiz, 0, 0);

        let results = SessionResults::summarize(&session, &empty, &[]);
        assert_eq!(results.score_percentage, 0);
        assert_eq!(results.total_questions, 0);
        assert!(results.review.is_empty());
    }

    #[test]
    fn open_session_has_zero_elapsed_minutes() {
        let quiz = build_quiz(&[1, 2]);
        let session = QuizSession::new(
            SessionId::random(),
            UserId::random(),
            quiz.id(),
            None,
            fixed_now(),
        );

        let results = SessionResults::summarize(&session, &quiz, &[]);
        assert_eq!(results.elapsed_minutes, 0);
    }

    #[test]
    fn unanswered_questions_show_in_review_without_selection() {
        let quiz = build_quiz(&[1, 2]);
        let session = finished_session(&quiz, 1, 1);
        let answers = answer_log(&session, &quiz, &[(1, true)]);

        let results = SessionResults::summarize(&session, &quiz, &answers);
        let second = &results.review[1];
        assert!(!second.answered);
        assert!(second.selected_answer.is_none());
        assert!(!second.is_correct);
        assert_eq!(second.correct_answer.as_deref(), Some("right 2"));
    }

    #[test]
    fn wrong_answer_review_carries_correct_answer_and_explanation() {
        let quiz = build_quiz(&[1]);
        let session = finished_session(&quiz, 0, 1);
        let answers = answer_log(&session, &quiz, &[(1, false)]);

        let results = SessionResults::summarize(&session, &quiz, &answers);
        let entry = &results.review[0];
        assert!(entry.answered);
        assert!(!entry.is_correct);
        assert_eq!(entry.selected_answer.as_deref(), Some("wrong 1"));
        assert_eq!(entry.correct_answer.as_deref(), Some("right 1"));
        assert_eq!(entry.explanation.as_deref(), Some("because 1"));
    }
}
