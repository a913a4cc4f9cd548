use std::sync::Arc;

use teloxide::{prelude::Requester, types::Message, utils::command::BotCommands, Bot};
use tracing::instrument;

use crate::{
    dashboard::{navigate, show_home},
    live::LiveTable,
    router::Route,
    session::AdminSessions,
    store::{connection::Document, Storage},
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot, or open a quiz link.")]
    Start(String),
    #[command(description = "stop whatever is running and go home.")]
    Cancel,
    #[command(description = "log in as administrator: /login <password>.")]
    Login(String),
    #[command(description = "log out.")]
    Logout,
    #[command(description = "open a quiz or podium link: /open <link>.")]
    Open(String),
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn start<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    param: String,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    let route = Route::from_start_param(&param);
    navigate(&bot, msg.chat.id, &dialogue, route, storage, &sessions, &live).await
}

#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn open<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    link: String,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    navigate(&bot, msg.chat.id, &dialogue, Route::parse(&link), storage, &sessions, &live).await
}

#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn cancel<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    live.teardown(msg.chat.id);
    bot.send_message(msg.chat.id, "Cancelled.").await?;
    show_home(&bot, msg.chat.id, &dialogue, &storage, &sessions).await
}

#[instrument(level = "info", skip(bot, dialogue, password, storage, sessions, live))]
pub(crate) async fn login<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    password: String,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    if !sessions.login(msg.chat.id, &password) {
        bot.send_message(msg.chat.id, "Wrong access code.").await?;
        return Ok(());
    }
    live.teardown(msg.chat.id);
    show_home(&bot, msg.chat.id, &dialogue, &storage, &sessions).await
}

#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn logout<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    sessions.logout(msg.chat.id);
    live.teardown(msg.chat.id);
    log::info!("Chat {} logged out", msg.chat.id);
    bot.send_message(msg.chat.id, "Logged out.").await?;
    show_home(&bot, msg.chat.id, &dialogue, &storage, &sessions).await
}
