//! The guest side of a quiz: name entry, timed answers, reveal, final score.
//!
//! The machine is driven from outside: `tick` once per second while a question
//! is open, `select` when the player picks an option, `advance` after the
//! reveal has been shown for [`REVEAL_DWELL`].

use std::time::Duration;

use crate::{
    error::PlayError,
    store::quiz::{PlayerResult, Question, Quiz},
};

/// Ticks a player gets per question.
pub const TIME_LIMIT: u32 = 15;
pub const TICK: Duration = Duration::from_secs(1);
pub const REVEAL_DWELL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Option(usize),
    /// The countdown ran out. Never correct.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    CollectingName,
    Answering { index: usize, time_left: u32 },
    Revealed { index: usize, selection: Selection },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub index: usize,
    pub selection: Selection,
    pub correct: bool,
}

/// How an option is shown once the answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Correct,
    WrongPick,
    Dimmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Question(usize),
    Finished,
    /// Nothing to advance from.
    Stay,
}

#[derive(Debug, Clone)]
pub struct Player {
    quiz: Quiz,
    name: String,
    score: u32,
    phase: Phase,
    result_taken: bool,
}

impl Player {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            name: String::new(),
            score: 0,
            phase: Phase::CollectingName,
            result_taken: false,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.quiz.questions().get(index)
    }

    fn open_question(&mut self, index: usize) {
        self.phase = if index < self.quiz.questions().len() {
            Phase::Answering {
                index,
                time_left: TIME_LIMIT,
            }
        } else {
            Phase::Finished
        };
    }

    pub fn submit_name(&mut self, name: &str) -> Result<(), PlayError> {
        if self.phase != Phase::CollectingName {
            return Err(PlayError::AlreadyStarted);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayError::BlankName);
        }

        self.name = name.to_owned();
        self.open_question(0);
        Ok(())
    }

    fn judge(&self, index: usize, selection: Selection) -> bool {
        match selection {
            Selection::Option(option) => self
                .question(index)
                .is_some_and(|question| question.is_correct(option)),
            Selection::TimedOut => false,
        }
    }

    fn submit(&mut self, index: usize, selection: Selection) -> Reveal {
        let correct = self.judge(index, selection);
        if correct {
            self.score += 1;
        }

        self.phase = Phase::Revealed { index, selection };
        Reveal {
            index,
            selection,
            correct,
        }
    }

    /// First selection on an open question wins. Anything else returns `None`.
    pub fn select(&mut self, option: usize) -> Option<Reveal> {
        let Phase::Answering { index, .. } = self.phase else {
            return None;
        };
        let in_range = self
            .question(index)
            .is_some_and(|question| option < question.options().len());
        if !in_range {
            return None;
        }

        Some(self.submit(index, Selection::Option(option)))
    }

    /// One second passes. Returns the timeout reveal when the clock hits zero.
    pub fn tick(&mut self) -> Option<Reveal> {
        let Phase::Answering { index, time_left } = self.phase else {
            return None;
        };

        let time_left = time_left.saturating_sub(1);
        if time_left == 0 {
            return Some(self.submit(index, Selection::TimedOut));
        }
        self.phase = Phase::Answering { index, time_left };
        None
    }

    /// The reveal currently on display, if any.
    pub fn reveal(&self) -> Option<Reveal> {
        let Phase::Revealed { index, selection } = self.phase else {
            return None;
        };
        Some(Reveal {
            index,
            selection,
            correct: self.judge(index, selection),
        })
    }

    pub fn time_left(&self) -> Option<u32> {
        match self.phase {
            Phase::Answering { time_left, .. } => Some(time_left),
            _ => None,
        }
    }

    /// Leaves the reveal for the next question, or finishes after the last one.
    pub fn advance(&mut self) -> Advance {
        let Phase::Revealed { index, .. } = self.phase else {
            return Advance::Stay;
        };

        self.open_question(index + 1);
        match self.phase {
            Phase::Answering { index, .. } => Advance::Question(index),
            _ => Advance::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The result to persist. Handed out once, and only after finishing.
    pub fn take_result(&mut self) -> Option<PlayerResult> {
        if !self.is_finished() || self.result_taken {
            return None;
        }
        self.result_taken = true;
        Some(PlayerResult::new(self.name.clone(), self.score))
    }

    pub fn marks(&self, reveal: &Reveal) -> Vec<OptionMark> {
        let Some(question) = self.question(reveal.index) else {
            return Vec::new();
        };

        (0..question.options().len())
            .map(|option| {
                if question.is_correct(option) {
                    OptionMark::Correct
                } else if reveal.selection == Selection::Option(option) {
                    OptionMark::WrongPick
                } else {
                    OptionMark::Dimmed
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> Quiz {
        Quiz::retreive(
            "q".into(),
            "Party".into(),
            vec![
                Question::new("One".into(), vec!["a".into(), "b".into()], 1),
                Question::new("Two".into(), vec!["a".into(), "b".into(), "c".into()], 2),
            ],
        )
    }

    fn started() -> Player {
        let mut player = Player::new(quiz());
        player.submit_name("Ann").unwrap();
        player
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut player = Player::new(quiz());

        assert_eq!(player.submit_name("   "), Err(PlayError::BlankName));
        assert_eq!(player.phase(), &Phase::CollectingName);

        player.submit_name("  Ann ").unwrap();
        assert_eq!(player.name(), "Ann");
        assert_eq!(player.submit_name("Bob"), Err(PlayError::AlreadyStarted));
    }

    #[test]
    fn correct_pick_scores_one() {
        let mut player = started();

        let reveal = player.select(1).unwrap();

        assert!(reveal.correct);
        assert_eq!(player.score(), 1);
        assert_eq!(
            player.marks(&reveal),
            vec![OptionMark::Dimmed, OptionMark::Correct]
        );
    }

    #[test]
    fn wrong_pick_scores_nothing() {
        let mut player = started();

        let reveal = player.select(0).unwrap();

        assert!(!reveal.correct);
        assert_eq!(player.score(), 0);
        assert_eq!(
            player.marks(&reveal),
            vec![OptionMark::WrongPick, OptionMark::Correct]
        );
    }

    #[test]
    fn first_selection_wins() {
        let mut player = started();

        let reveal = player.select(0).unwrap();
        assert_eq!(player.select(1), None);
        assert_eq!(player.reveal(), Some(reveal));
        assert_eq!(player.score(), 0);
        assert_eq!(player.tick(), None);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut player = started();
        assert_eq!(player.select(7), None);
        assert_eq!(player.time_left(), Some(TIME_LIMIT));
    }

    #[test]
    fn countdown_times_out_as_wrong_answer() {
        let mut player = started();

        for _ in 1..TIME_LIMIT {
            assert_eq!(player.tick(), None);
        }
        assert_eq!(player.time_left(), Some(1));

        let reveal = player.tick().unwrap();
        assert_eq!(reveal.selection, Selection::TimedOut);
        assert!(!reveal.correct);
        assert_eq!(player.score(), 0);
        assert_eq!(player.advance(), Advance::Question(1));
        assert_eq!(player.time_left(), Some(TIME_LIMIT));
    }

    #[test]
    fn plays_through_to_one_result() {
        let mut player = started();

        assert_eq!(player.advance(), Advance::Stay);
        player.select(1).unwrap();
        assert_eq!(player.take_result(), None);
        assert_eq!(player.advance(), Advance::Question(1));
        player.select(2).unwrap();
        assert_eq!(player.advance(), Advance::Finished);

        let result = player.take_result().unwrap();
        assert_eq!(result.name(), "Ann");
        assert_eq!(result.score(), 2);
        assert_eq!(player.take_result(), None);
        assert_eq!(player.select(0), None);
    }
}
