use std::{sync::Arc, time::Duration};

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, Message, MessageId},
    Bot,
};
use tracing::instrument;

use crate::{
    dashboard::{navigate, show_home},
    keyboard::back_keyboard,
    live::LiveTable,
    router::Route,
    session::AdminSessions,
    state::QuizState,
    store::{
        connection::Document,
        quiz::{PlayerResult, Quiz},
        Storage,
    },
    HandlerResult, UserDialogue,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Real results, best score first. Ties keep the order they were stored in.
pub fn rank(results: &[PlayerResult]) -> Vec<&PlayerResult> {
    let mut ranked: Vec<&PlayerResult> = results.iter().filter(|r| !r.is_sentinel()).collect();
    ranked.sort_by(|a, b| b.score().cmp(&a.score()));
    ranked
}

pub fn render(quiz: &Quiz, results: &[PlayerResult]) -> String {
    let ranked = rank(results);
    let mut board = format!("🏆 Podium\n{}\n", quiz.title());

    if ranked.is_empty() {
        board.push_str("\nWaiting for the first results...");
        return board;
    }

    for (i, result) in ranked.iter().enumerate() {
        let place = MEDALS
            .get(i)
            .map(|medal| medal.to_string())
            .unwrap_or_else(|| format!("{}.", i + 1));
        board.push_str(&format!("\n{} {}: {} pts", place, result.name(), result.score()));
    }
    board
}

async fn watch<D: Document>(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    quiz: Quiz,
    storage: Arc<Storage<D>>,
) {
    let mut ticks = tokio::time::interval(POLL_INTERVAL);
    let mut shown = String::new();

    loop {
        ticks.tick().await;

        let results = match storage.results(quiz.id()).await {
            Ok(results) => results,
            Err(e) => {
                log::error!("Refreshing podium of '{}' failed: {}", quiz.title(), e);
                continue;
            }
        };

        let board = render(&quiz, &results);
        if board == shown {
            continue;
        }
        match bot.edit_message_text(chat_id, message_id, board.clone()).await {
            Ok(_) => shown = board,
            Err(e) => log::warn!("Couldn't update podium in chat {}: {}", chat_id, e),
        }
    }
}

/// Shows the podium of `quiz` and keeps it fresh until the chat leaves it.
#[instrument(level = "info", skip(bot, dialogue, quiz, storage, live), fields(quiz = %quiz.id()))]
pub(crate) async fn open<D: Document>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    quiz: Quiz,
    storage: Arc<Storage<D>>,
    live: &LiveTable,
) -> HandlerResult {
    let message = bot
        .send_message(chat_id, format!("🏆 Podium\n{}\n\nLoading results...", quiz.title()))
        .reply_markup(back_keyboard())
        .await?;

    log::info!("Chat {} watches the podium of '{}'", chat_id, quiz.title());
    let handle = tokio::spawn(watch(bot.clone(), chat_id, message.id, quiz.clone(), storage));
    live.set_board(chat_id, handle.abort_handle());

    dialogue.update(QuizState::Podium { quiz }).await?;
    Ok(())
}

/// Any message on the podium screen leaves it, following the link it carries.
#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn leave<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    live.clear_board(msg.chat.id);
    match Route::from_message(msg.text()) {
        Route::Home => show_home(&bot, msg.chat.id, &dialogue, &storage, &sessions).await,
        route => navigate(&bot, msg.chat.id, &dialogue, route, storage, &sessions, &live).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::quiz::{Question, SENTINEL_RESULT_ID};

    fn result(name: &str, score: u32) -> PlayerResult {
        PlayerResult::retreive(name.to_lowercase(), name.into(), score)
    }

    fn quiz() -> Quiz {
        Quiz::retreive(
            "q".into(),
            "Party".into(),
            vec![Question::new("Q".into(), vec!["a".into(), "b".into()], 0)],
        )
    }

    #[test]
    fn ranks_by_score_keeping_ties_stable() {
        let results = vec![result("A", 3), result("B", 5), result("C", 3)];

        let names: Vec<&str> = rank(&results).iter().map(|r| r.name()).collect();

        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn sentinel_entries_are_hidden() {
        let results = vec![
            PlayerResult::retreive(SENTINEL_RESULT_ID.into(), String::new(), 99),
            result("A", 1),
        ];

        assert_eq!(rank(&results).len(), 1);
    }

    #[test]
    fn top_three_get_medals() {
        let results = vec![
            result("A", 1),
            result("B", 4),
            result("C", 3),
            result("D", 2),
        ];

        let board = render(&quiz(), &results);

        assert!(board.contains("🥇 B: 4 pts"));
        assert!(board.contains("🥈 C: 3 pts"));
        assert!(board.contains("🥉 D: 2 pts"));
        assert!(board.contains("4. A: 1 pts"));
    }

    #[test]
    fn empty_board_waits() {
        assert!(render(&quiz(), &[]).contains("Waiting for the first results"));
    }
}
