use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod codec;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod draft;
pub mod editor;
pub mod error;
pub mod keyboard;
pub mod live;
pub mod player;
pub mod podium;
pub mod router;
pub mod runner;
pub mod schema;
pub mod session;
pub mod state;
pub mod store;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
