use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{self, Command},
    dashboard, editor, podium, runner,
    session::AdminSessions,
    state::QuizState,
    store::connection::JsonBin,
    HandlerResult,
};

type Branch = Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn Error + Send + Sync + 'static>>,
    DpHandlerDescription,
>;

pub fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Start(param)].endpoint(commands::start::<JsonBin>))
        .branch(case![Command::Cancel].endpoint(commands::cancel::<JsonBin>))
        .branch(case![Command::Login(password)].endpoint(commands::login::<JsonBin>))
        .branch(case![Command::Logout].endpoint(commands::logout::<JsonBin>))
        .branch(case![Command::Open(link)].endpoint(commands::open::<JsonBin>));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(dashboard::idle::<JsonBin>))
        .branch(
            case![QuizState::ReceivePassword].endpoint(dashboard::receive_password::<JsonBin>),
        )
        .branch(admin_scheme())
        .branch(guest_scheme())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

/// Screens only a logged in chat may use.
#[instrument(level = "debug")]
fn admin_scheme() -> Branch {
    use dptree::case;
    log::debug!("Building dispatching tree for the dashboard");
    dptree::filter(|msg: Message, sessions: Arc<AdminSessions>| sessions.is_admin(msg.chat.id))
        .branch(case![QuizState::Dashboard].endpoint(dashboard::choose_what_to_do::<JsonBin>))
        .branch(case![QuizState::SelectQuiz { quizzes }].endpoint(dashboard::select_quiz))
        .branch(case![QuizState::HandleQuiz { quiz }].endpoint(dashboard::handle_quiz::<JsonBin>))
        .branch(
            case![QuizState::ConfirmDelete { quiz }]
                .endpoint(dashboard::confirm_delete::<JsonBin>),
        )
        .branch(case![QuizState::Editing { draft }].endpoint(editor::edit::<JsonBin>))
}

#[instrument(level = "debug")]
fn guest_scheme() -> Branch {
    use dptree::case;
    log::debug!("Building dispatching tree for players");
    dptree::entry()
        .branch(
            case![QuizState::ReceivePlayerName { quiz }]
                .endpoint(runner::receive_player_name::<JsonBin>),
        )
        .branch(case![QuizState::Playing].endpoint(runner::playing))
        .branch(case![QuizState::Podium { quiz }].endpoint(podium::leave::<JsonBin>))
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> Branch {
    use dptree::case;
    log::debug!("Building dispatching tree for callback queries");
    Update::filter_callback_query().branch(case![QuizState::Playing].endpoint(runner::take_answer))
}

#[instrument(level = "info", skip(bot))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!("Chat {}: unexpected input {:?}", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
