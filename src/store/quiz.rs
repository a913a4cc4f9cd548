use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use teloxide::utils::html::escape;
use uuid::Uuid;

use crate::error::{Problem, ValidationError};

/// Id of the placeholder entry some clients write when a podium is created.
pub const SENTINEL_RESULT_ID: &str = "init";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    id: String,
    title: String,
    questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    answer_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: u32,
}

/// The whole persisted state: every quiz plus every podium, keyed by quiz id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(default)]
    pub podiums: HashMap<String, Vec<PlayerResult>>,
}

impl fmt::Display for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut questions = String::new();
        for (i, question) in self.questions().iter().enumerate() {
            questions.push_str(&format!("\n#{} {}", i + 1, question));
        }
        write!(f, "<b>{}</b>\n\nQuestions:{}", escape(self.title()), questions)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut options = String::new();
        for (i, option) in self.options().iter().enumerate() {
            let mark = if i == self.answer_index { 'V' } else { 'X' };
            options.push_str(&format!("{}) {} ({})\n", i + 1, escape(option), mark));
        }

        write!(f, "{}\n{}", escape(self.text()), options)
    }
}

impl Quiz {
    pub fn new(title: String, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            title,
            questions,
        }
    }

    pub fn retreive(id: String, title: String, questions: Vec<Question>) -> Self {
        Self {
            id,
            title,
            questions,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Checks the invariants a playable quiz must hold.
    pub fn check(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push(Problem::EmptyTitle);
        }
        if self.questions.is_empty() {
            problems.push(Problem::NoQuestions);
        }
        for (i, question) in self.questions.iter().enumerate() {
            if question.options.len() < 2 {
                problems.push(Problem::TooFewOptions(i + 1));
            }
            if question.answer_index >= question.options.len() {
                problems.push(Problem::AnswerOutOfRange(i + 1));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems })
        }
    }
}

impl Question {
    pub fn new(text: String, options: Vec<String>, answer_index: usize) -> Self {
        Self {
            text,
            options,
            answer_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.answer_index
    }
}

impl PlayerResult {
    pub fn new(name: String, score: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            score,
        }
    }

    pub fn retreive(id: String, name: String, score: u32) -> Self {
        Self { id, name, score }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_RESULT_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_documents_written_by_older_clients() {
        let raw = r#"{
            "quizzes": [{
                "id": "1729000000000",
                "title": "Birthday",
                "questions": [{"question": "Age?", "options": ["30", "31"], "answerIndex": 1}]
            }],
            "podiums": {"1729000000000": [{"id": "init", "name": "", "score": 0}]}
        }"#;

        let data: AppData = serde_json::from_str(raw).unwrap();

        assert_eq!(data.quizzes[0].title(), "Birthday");
        assert_eq!(data.quizzes[0].questions()[0].answer_index(), 1);
        assert!(data.podiums["1729000000000"][0].is_sentinel());
    }

    #[test]
    fn bare_sentinel_reads_as_result() {
        let result: PlayerResult = serde_json::from_str(r#"{"id": "init"}"#).unwrap();
        assert!(result.is_sentinel());
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn missing_podiums_default_to_empty() {
        let data: AppData = serde_json::from_str(r#"{"quizzes": []}"#).unwrap();
        assert!(data.podiums.is_empty());
    }

    #[test]
    fn check_reports_out_of_range_answer() {
        let quiz = Quiz::retreive(
            "q".into(),
            "Title".into(),
            vec![Question::new("Text".into(), vec!["a".into(), "b".into()], 2)],
        );

        let err = quiz.check().unwrap_err();
        assert_eq!(err.problems, vec![Problem::AnswerOutOfRange(1)]);
    }
}
