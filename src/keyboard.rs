use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{player::OptionMark, store::quiz::Quiz};

pub(crate) const CREATE_QUIZ: &str = "Create a new quiz🏗️";
pub(crate) const MY_QUIZZES: &str = "My quizzes📋";
pub(crate) const SHARE: &str = "Share🔗";
pub(crate) const PODIUM: &str = "Podium🏆";
pub(crate) const EDIT: &str = "Edit✏️";
pub(crate) const DELETE: &str = "Delete🗑️";
pub(crate) const BACK: &str = "Back";
pub(crate) const HOME: &str = "Back to home🏠";

pub(crate) const ANSWER_PREFIX: &str = "answer:";
pub(crate) const ANSWERED: &str = "answered";

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn dashboard_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(CREATE_QUIZ)],
        vec![KeyboardButton::new(MY_QUIZZES)],
    ];

    KeyboardMarkup::new(keyboard)
}

/// One numbered button per quiz; the number is what gets parsed back.
pub(crate) fn quizes_keyboard(quizes: &[Quiz]) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = quizes
        .iter()
        .enumerate()
        .map(|(i, quiz)| vec![KeyboardButton::new(format!("{}. {}", i + 1, quiz.title()))])
        .collect();
    keyboard.push(vec![KeyboardButton::new(BACK)]);

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn edit_quiz_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(SHARE), KeyboardButton::new(PODIUM)],
        vec![KeyboardButton::new(EDIT), KeyboardButton::new(DELETE)],
        vec![KeyboardButton::new(BACK)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn back_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(HOME)]])
}

pub(crate) fn answers_keyboard(options: &[String]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            vec![InlineKeyboardButton::callback(
                option.clone(),
                format!("{ANSWER_PREFIX}{i}"),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

/// The options once answered: correct in green, a wrong pick in red, the rest dimmed.
pub(crate) fn revealed_keyboard(options: &[String], marks: &[OptionMark]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .zip(marks)
        .map(|(option, mark)| {
            let icon = match mark {
                OptionMark::Correct => "✅",
                OptionMark::WrongPick => "❌",
                OptionMark::Dimmed => "▫️",
            };
            vec![InlineKeyboardButton::callback(
                format!("{icon} {option}"),
                ANSWERED,
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

/// Index of the quiz a `quizes_keyboard` button points at.
pub(crate) fn parse_quiz_choice(text: &str) -> Option<usize> {
    let (number, _) = text.split_once('.')?;
    number.trim().parse::<usize>().ok()?.checked_sub(1)
}

pub(crate) fn parse_answer(data: &str) -> Option<usize> {
    data.strip_prefix(ANSWER_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_choice_round_trips() {
        assert_eq!(parse_quiz_choice("3. Birthday. Again"), Some(2));
        assert_eq!(parse_quiz_choice("0. Nope"), None);
        assert_eq!(parse_quiz_choice("Birthday"), None);
    }

    #[test]
    fn answer_data_round_trips() {
        let keyboard = answers_keyboard(&["a".into(), "b".into()]);
        assert_eq!(keyboard.inline_keyboard.len(), 2);

        assert_eq!(parse_answer("answer:1"), Some(1));
        assert_eq!(parse_answer(ANSWERED), None);
        assert_eq!(parse_answer("answer:x"), None);
    }
}
