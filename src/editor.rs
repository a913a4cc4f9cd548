use std::sync::Arc;

use teloxide::{prelude::Requester, types::Message, Bot};
use tracing::instrument;

use crate::{
    dashboard::show_dashboard,
    draft::{self, EditMode, EditorCommand, QuizDraft, EDITOR_USAGE},
    state::QuizState,
    store::{connection::Document, Storage},
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bot, dialogue, draft, storage))]
pub(crate) async fn edit<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    mut draft: QuizDraft,
    storage: Arc<Storage<D>>,
) -> HandlerResult {
    let Some(command) = msg.text().and_then(EditorCommand::parse) else {
        log::info!("Chat {}: unknown editor input {:?}", msg.chat.id, msg.text());
        bot.send_message(msg.chat.id, format!("Unknown command.\n\n{EDITOR_USAGE}"))
            .await?;
        return Ok(());
    };

    match command {
        EditorCommand::Cancel => {
            log::info!("Chat {} discards its draft", msg.chat.id);
            bot.send_message(msg.chat.id, "Changes discarded.").await?;
            show_dashboard(&bot, msg.chat.id, &dialogue).await?;
        }
        EditorCommand::Save => save(&bot, &msg, &dialogue, &draft, &storage).await?,
        command => match command.apply(&mut draft) {
            Ok(()) => {
                bot.send_message(msg.chat.id, draft::render(&draft)).await?;
                dialogue.update(QuizState::Editing { draft }).await?;
            }
            Err(e) => {
                bot.send_message(msg.chat.id, format!("Can't do that: {e}."))
                    .await?;
            }
        },
    }

    Ok(())
}

async fn save<D: Document>(
    bot: &Bot,
    msg: &Message,
    dialogue: &UserDialogue,
    draft: &QuizDraft,
    storage: &Storage<D>,
) -> HandlerResult {
    let quizzes = match storage.quizzes().await {
        Ok(quizzes) => quizzes,
        Err(e) => {
            log::error!("Loading quizzes before save failed: {}", e);
            bot.send_message(msg.chat.id, "Couldn't reach the store. Send save to retry.")
                .await?;
            return Ok(());
        }
    };

    let updated = match draft.commit(&quizzes) {
        Ok(updated) => updated,
        Err(problems) => {
            bot.send_message(msg.chat.id, format!("The quiz can't be saved yet:\n{problems}"))
                .await?;
            return Ok(());
        }
    };

    if let Err(e) = storage.replace_quizzes(updated).await {
        log::error!("Saving quizzes failed: {}", e);
        bot.send_message(msg.chat.id, "Saving failed. Send save to retry.")
            .await?;
        return Ok(());
    }

    let verb = match draft.mode {
        EditMode::Create => "created",
        EditMode::Edit(_) => "updated",
    };
    log::info!("Chat {} {} quiz '{}'", msg.chat.id, verb, draft.title.trim());
    bot.send_message(msg.chat.id, format!("Quiz '{}' {}.", draft.title.trim(), verb))
        .await?;
    show_dashboard(bot, msg.chat.id, dialogue).await?;
    Ok(())
}
