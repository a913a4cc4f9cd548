use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),
    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("share token is not valid percent-encoded UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("share token is not a quiz: {0}")]
    Json(#[from] serde_json::Error),
    #[error("shared quiz is incomplete: {0}")]
    Incomplete(ValidationError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to the document store failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document store answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("document could not be serialized: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("there is no question #{0}")]
    NoSuchQuestion(usize),
    #[error("question #{question} has no option #{option}")]
    NoSuchOption { question: usize, option: usize },
    #[error("a question needs at least {0} options")]
    TooFewOptions(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayError {
    #[error("player name can't be blank")]
    BlankName,
    #[error("the quiz has already started")]
    AlreadyStarted,
}

/// One reason a draft can't be saved. Question and option numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    EmptyTitle,
    NoQuestions,
    EmptyQuestionText(usize),
    EmptyOption { question: usize, option: usize },
    NoAnswer(usize),
    AnswerOutOfRange(usize),
    TooFewOptions(usize),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::EmptyTitle => write!(f, "the quiz needs a title"),
            Problem::NoQuestions => write!(f, "the quiz needs at least one question"),
            Problem::EmptyQuestionText(q) => write!(f, "question #{q} has no text"),
            Problem::EmptyOption { question, option } => {
                write!(f, "option #{option} of question #{question} is empty")
            }
            Problem::NoAnswer(q) => write!(f, "question #{q} has no correct answer selected"),
            Problem::AnswerOutOfRange(q) => {
                write!(f, "question #{q} points at an option that doesn't exist")
            }
            Problem::TooFewOptions(q) => write!(f, "question #{q} needs at least two options"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub struct ValidationError {
    pub problems: Vec<Problem>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.problems.iter().map(|p| format!("- {p}")).collect();
        write!(f, "{}", lines.join("\n"))
    }
}
