use crate::{draft::QuizDraft, store::quiz::Quiz};

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,

    // PART FOR --- ADMIN ---
    ReceivePassword,
    Dashboard,
    SelectQuiz {
        quizzes: Vec<Quiz>,
    },
    HandleQuiz {
        quiz: Quiz,
    },
    ConfirmDelete {
        quiz: Quiz,
    },

    // PART FOR --- EDITING ---
    Editing {
        draft: QuizDraft,
    },

    // PART FOR --- PLAYING ---
    // The running player lives in the `LiveTable`.
    ReceivePlayerName {
        quiz: Quiz,
    },
    Playing,

    // PART FOR --- PODIUM ---
    Podium {
        quiz: Quiz,
    },
}
