use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerDraft, QuestionDraft, QuizDifficulty, QuizDraft, QuizId, UserId};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    questions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestions { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut questions = 3_u32;
        let mut now = None;

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => db_url = require_value(&mut iter, "--db")?,
                "--questions" => {
                    let raw = require_value(&mut iter, "--questions")?;
                    questions = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuestions { raw })?;
                }
                "--now" => {
                    let raw = require_value(&mut iter, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&raw)
                        .map_err(|_| ArgsError::InvalidNow { raw })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                other => return Err(ArgsError::UnknownArg(other.to_owned())),
            }
        }

        Ok(Self {
            db_url,
            questions,
            now,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;
    let now = args.now.unwrap_or_else(Utc::now);

    let storage = Storage::sqlite(&args.db_url).await?;

    let samples = [
        ("What does `let` introduce?", "a binding", "a loop"),
        ("Which keyword borrows mutably?", "&mut", "&&"),
        ("What does `?` do?", "propagates errors", "prints a value"),
        ("Which trait powers `for` loops?", "Iterator", "Display"),
        ("What is `Vec<T>`?", "a growable array", "a hash map"),
    ];

    let questions = (0..args.questions)
        .map(|i| {
            let idx = (i as usize) % samples.len();
            let (question, right, wrong) = samples[idx];
            QuestionDraft {
                text: question.to_owned(),
                order: i + 1,
                answers: vec![
                    AnswerDraft {
                        text: format!("{right} (#{})", i + 1),
                        is_correct: true,
                        explanation: Some(format!("{right} is the answer")),
                    },
                    AnswerDraft {
                        text: format!("{wrong} (#{})", i + 1),
                        is_correct: false,
                        explanation: None,
                    },
                ],
            }
        })
        .collect();

    let quiz = QuizDraft {
        title: "Rust warm-up".to_owned(),
        description: Some("Seeded demo quiz".to_owned()),
        category: "programming".to_owned(),
        difficulty: QuizDifficulty::Beginner,
        questions,
    }
    .validate(QuizId::random(), Some(UserId::random()), now)?;

    storage.quizzes.upsert_quiz(&quiz).await?;

    println!(
        "Seeded quiz {} with {} questions into {}",
        quiz.id(),
        quiz.question_count(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
