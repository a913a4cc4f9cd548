//! Editable quiz drafts and the commands that change them.

use crate::{
    error::{EditError, Problem, ValidationError},
    store::quiz::{Question, Quiz},
};

pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    Create,
    /// Editing the stored quiz with this id.
    Edit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub answer: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub mode: EditMode,
    pub title: String,
    pub questions: Vec<QuestionDraft>,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            options: vec![String::new(); MIN_OPTIONS],
            answer: None,
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        Self {
            text: question.text().to_owned(),
            options: question.options().to_vec(),
            answer: Some(question.answer_index()),
        }
    }
}

impl QuestionDraft {
    fn is_complete(&self) -> bool {
        !self.text.trim().is_empty()
            && self.options.iter().all(|o| !o.trim().is_empty())
            && self.answer.is_some()
    }
}

impl QuizDraft {
    /// A fresh draft starts with one blank question.
    pub fn create() -> Self {
        Self {
            mode: EditMode::Create,
            title: String::new(),
            questions: vec![QuestionDraft::default()],
        }
    }

    pub fn edit(quiz: &Quiz) -> Self {
        Self {
            mode: EditMode::Edit(quiz.id().to_owned()),
            title: quiz.title().to_owned(),
            questions: quiz.questions().iter().map(QuestionDraft::from).collect(),
        }
    }

    fn question_mut(&mut self, question: usize) -> Result<&mut QuestionDraft, EditError> {
        self.questions
            .get_mut(question)
            .ok_or(EditError::NoSuchQuestion(question + 1))
    }

    fn option_mut(&mut self, question: usize, option: usize) -> Result<&mut String, EditError> {
        self.question_mut(question)?
            .options
            .get_mut(option)
            .ok_or(EditError::NoSuchOption {
                question: question + 1,
                option: option + 1,
            })
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn add_question(&mut self) {
        self.questions.push(QuestionDraft::default());
    }

    pub fn remove_question(&mut self, question: usize) -> Result<(), EditError> {
        if question >= self.questions.len() {
            return Err(EditError::NoSuchQuestion(question + 1));
        }
        self.questions.remove(question);
        Ok(())
    }

    pub fn set_question_text(
        &mut self,
        question: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.question_mut(question)?.text = text.into();
        Ok(())
    }

    pub fn add_option(&mut self, question: usize) -> Result<(), EditError> {
        self.question_mut(question)?.options.push(String::new());
        Ok(())
    }

    /// Refuses to go below [`MIN_OPTIONS`]. The selected answer keeps pointing
    /// at the same option, or is cleared if that option goes away.
    pub fn remove_option(&mut self, question: usize, option: usize) -> Result<(), EditError> {
        self.option_mut(question, option)?;
        let draft = self.question_mut(question)?;
        if draft.options.len() <= MIN_OPTIONS {
            return Err(EditError::TooFewOptions(MIN_OPTIONS));
        }

        draft.options.remove(option);
        draft.answer = match draft.answer {
            Some(answer) if answer == option => None,
            Some(answer) if answer > option => Some(answer - 1),
            other => other,
        };
        Ok(())
    }

    pub fn set_option_text(
        &mut self,
        question: usize,
        option: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        *self.option_mut(question, option)? = text.into();
        Ok(())
    }

    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), EditError> {
        self.option_mut(question, option)?;
        self.question_mut(question)?.answer = Some(option);
        Ok(())
    }

    /// Builds the quiz this draft describes, or every reason it can't be saved.
    pub fn validate(&self) -> Result<Quiz, ValidationError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push(Problem::EmptyTitle);
        }
        if self.questions.is_empty() {
            problems.push(Problem::NoQuestions);
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for (i, draft) in self.questions.iter().enumerate() {
            let number = i + 1;
            if draft.text.trim().is_empty() {
                problems.push(Problem::EmptyQuestionText(number));
            }
            for (o, option) in draft.options.iter().enumerate() {
                if option.trim().is_empty() {
                    problems.push(Problem::EmptyOption {
                        question: number,
                        option: o + 1,
                    });
                }
            }
            match draft.answer {
                None => problems.push(Problem::NoAnswer(number)),
                Some(answer) if draft.is_complete() => {
                    questions.push(Question::new(
                        draft.text.clone(),
                        draft.options.clone(),
                        answer,
                    ));
                }
                Some(_) => {}
            }
        }

        if !problems.is_empty() {
            return Err(ValidationError { problems });
        }

        let title = self.title.clone();
        Ok(match &self.mode {
            EditMode::Create => Quiz::new(title, questions),
            EditMode::Edit(id) => Quiz::retreive(id.clone(), title, questions),
        })
    }

    /// The quiz list after saving this draft: appended when created, replaced
    /// in place when edited. `quizzes` itself is left untouched.
    pub fn commit(&self, quizzes: &[Quiz]) -> Result<Vec<Quiz>, ValidationError> {
        let quiz = self.validate()?;
        let mut updated = quizzes.to_vec();

        match updated.iter_mut().find(|q| q.id() == quiz.id()) {
            Some(existing) => *existing = quiz,
            None => updated.push(quiz),
        }
        Ok(updated)
    }
}

/// A line typed by the administrator while editing. Numbers are 0-based here
/// and 1-based in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    Title(String),
    AddQuestion,
    RemoveQuestion(usize),
    QuestionText(usize, String),
    AddOption(usize),
    RemoveOption(usize, usize),
    OptionText(usize, usize, String),
    Answer(usize, usize),
    Save,
    Cancel,
}

pub const EDITOR_USAGE: &str = "Editor commands:
title <text>
add question
remove question <q>
question <q> <text>
add option <q>
remove option <q>.<o>
option <q>.<o> <text>
answer <q>.<o>
save
cancel";

fn number(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

fn pair(raw: &str) -> Option<(usize, usize)> {
    let (q, o) = raw.split_once('.')?;
    Some((number(q)?, number(o)?))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

fn lowered<'a>((head, rest): (&str, &'a str)) -> (String, &'a str) {
    (head.to_lowercase(), rest)
}

impl EditorCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let (head, rest) = split_word(line.trim());

        match head.to_lowercase().as_str() {
            "title" if !rest.is_empty() => Some(Self::Title(rest.to_owned())),
            "save" if rest.is_empty() => Some(Self::Save),
            "cancel" if rest.is_empty() => Some(Self::Cancel),
            "add" => match lowered(split_word(rest)) {
                (kind, "") if kind == "question" => Some(Self::AddQuestion),
                (kind, q) if kind == "option" => Some(Self::AddOption(number(q)?)),
                _ => None,
            },
            "remove" => match lowered(split_word(rest)) {
                (kind, q) if kind == "question" => Some(Self::RemoveQuestion(number(q)?)),
                (kind, qo) if kind == "option" => {
                    let (q, o) = pair(qo)?;
                    Some(Self::RemoveOption(q, o))
                }
                _ => None,
            },
            "question" => {
                let (q, text) = split_word(rest);
                if text.is_empty() {
                    return None;
                }
                Some(Self::QuestionText(number(q)?, text.to_owned()))
            }
            "option" => {
                let (qo, text) = split_word(rest);
                if text.is_empty() {
                    return None;
                }
                let (q, o) = pair(qo)?;
                Some(Self::OptionText(q, o, text.to_owned()))
            }
            "answer" => {
                let (q, o) = pair(rest)?;
                Some(Self::Answer(q, o))
            }
            _ => None,
        }
    }

    /// Applies an editing command. `Save` and `Cancel` leave the draft alone;
    /// the caller decides what they mean.
    pub fn apply(&self, draft: &mut QuizDraft) -> Result<(), EditError> {
        match self {
            Self::Title(title) => draft.set_title(title.clone()),
            Self::AddQuestion => draft.add_question(),
            Self::RemoveQuestion(q) => draft.remove_question(*q)?,
            Self::QuestionText(q, text) => draft.set_question_text(*q, text.clone())?,
            Self::AddOption(q) => draft.add_option(*q)?,
            Self::RemoveOption(q, o) => draft.remove_option(*q, *o)?,
            Self::OptionText(q, o, text) => draft.set_option_text(*q, *o, text.clone())?,
            Self::Answer(q, o) => draft.select_answer(*q, *o)?,
            Self::Save | Self::Cancel => {}
        }
        Ok(())
    }
}

/// Plain-text rendering of a draft for the editor screen.
pub fn render(draft: &QuizDraft) -> String {
    let heading = match draft.mode {
        EditMode::Create => "New quiz",
        EditMode::Edit(_) => "Editing quiz",
    };
    let title = if draft.title.trim().is_empty() {
        "(no title)"
    } else {
        draft.title.as_str()
    };

    let mut out = format!("{heading}: {title}\n");
    for (i, question) in draft.questions.iter().enumerate() {
        let text = if question.text.trim().is_empty() {
            "(empty)"
        } else {
            question.text.as_str()
        };
        out.push_str(&format!("\nQuestion {}: {}\n", i + 1, text));
        for (o, option) in question.options.iter().enumerate() {
            let mark = if question.answer == Some(o) { "●" } else { "○" };
            out.push_str(&format!("  {mark} {}.{} {}\n", i + 1, o + 1, option));
        }
    }
    out
}
