use std::{future::Future, sync::Arc};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, ParseMode},
    utils::html::escape,
    Bot,
};
use tokio::{
    sync::Notify,
    time::{self, Instant},
};
use tracing::instrument;

use crate::{
    error::PlayError,
    keyboard::{answers_keyboard, back_keyboard, parse_answer, revealed_keyboard},
    live::LiveTable,
    player::{Advance, Phase, Player, Reveal, Selection, REVEAL_DWELL, TICK, TIME_LIMIT},
    state::QuizState,
    store::{connection::Document, quiz::Quiz, Storage},
    HandlerResult, UserDialogue,
};

/// Seconds left at which the question message is refreshed.
const COUNTDOWN_MARKS: [u32; 2] = [10, 5];

struct Asked {
    index: usize,
    total: usize,
    text: String,
    options: Vec<String>,
}

fn question_text(asked: &Asked, time_left: u32) -> String {
    format!(
        "Question {}/{}\n<b>{}</b>\n\n⏱ {}s",
        asked.index + 1,
        asked.total,
        escape(&asked.text),
        time_left
    )
}

fn reveal_text(asked: &Asked, reveal: &Reveal) -> String {
    let verdict = match (reveal.selection, reveal.correct) {
        (Selection::TimedOut, _) => "⌛ Time's up!",
        (_, true) => "✅ Correct!",
        (_, false) => "❌ Wrong!",
    };
    format!(
        "Question {}/{}\n<b>{}</b>\n\n{}",
        asked.index + 1,
        asked.total,
        escape(&asked.text),
        verdict
    )
}

fn current_question(player: &Player) -> Option<Asked> {
    let Phase::Answering { index, .. } = *player.phase() else {
        return None;
    };
    player.question(index).map(|question| Asked {
        index,
        total: player.quiz().questions().len(),
        text: question.text().to_owned(),
        options: question.options().to_vec(),
    })
}

/// Waits for the answer or the end of the countdown, calling `refresh` with
/// the seconds left at each countdown mark. `None` once the play is gone.
async fn await_reveal<F, Fut>(
    chat_id: ChatId,
    answered: &Notify,
    live: &LiveTable,
    mut refresh: F,
) -> Option<Reveal>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticks = time::interval_at(Instant::now() + TICK, TICK);

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let (reveal, time_left) = live.with_play(chat_id, |play| {
                    let reveal = play.player.tick().or_else(|| play.player.reveal());
                    (reveal, play.player.time_left())
                })?;
                if reveal.is_some() {
                    return reveal;
                }
                if let Some(left) = time_left.filter(|left| COUNTDOWN_MARKS.contains(left)) {
                    refresh(left).await;
                }
            }
            _ = answered.notified() => {
                // A permit left over from an earlier question finds no reveal.
                let reveal = live.with_play(chat_id, |play| play.player.reveal())?;
                if reveal.is_some() {
                    return reveal;
                }
            }
        }
    }
}

/// Keeps the reveal on screen, then moves the player on.
async fn dwell_and_advance(chat_id: ChatId, live: &LiveTable) -> Option<Advance> {
    time::sleep(REVEAL_DWELL).await;
    live.with_play(chat_id, |play| {
        play.message = None;
        play.player.advance()
    })
}

async fn play_through<D: Document>(
    bot: &Bot,
    chat_id: ChatId,
    answered: &Notify,
    storage: &Storage<D>,
    live: &LiveTable,
) -> HandlerResult {
    loop {
        let Some(asked) = live
            .with_play(chat_id, |play| current_question(&play.player))
            .flatten()
        else {
            break;
        };

        log::info!("Chat {}: asking question #{}", chat_id, asked.index + 1);
        let sent = bot
            .send_message(chat_id, question_text(&asked, TIME_LIMIT))
            .parse_mode(ParseMode::Html)
            .reply_markup(answers_keyboard(&asked.options))
            .await;
        // Without a message the question still runs out and the play goes on.
        let message_id = match sent {
            Ok(message) => {
                live.with_play(chat_id, |play| play.message = Some(message.id));
                Some(message.id)
            }
            Err(e) => {
                log::error!("Couldn't send question #{} to chat {}: {}", asked.index + 1, chat_id, e);
                None
            }
        };

        let refresh = |left: u32| {
            let asked = &asked;
            async move {
                let Some(message_id) = message_id else {
                    return;
                };
                let refreshed = bot
                    .edit_message_text(chat_id, message_id, question_text(asked, left))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(answers_keyboard(&asked.options))
                    .await;
                if let Err(e) = refreshed {
                    log::warn!("Couldn't refresh countdown in chat {}: {}", chat_id, e);
                }
            }
        };
        let Some(reveal) = await_reveal(chat_id, answered, live, refresh).await else {
            return Ok(());
        };

        let Some(marks) = live.with_play(chat_id, |play| play.player.marks(&reveal)) else {
            return Ok(());
        };
        if let Some(message_id) = message_id {
            let revealed = bot
                .edit_message_text(chat_id, message_id, reveal_text(&asked, &reveal))
                .parse_mode(ParseMode::Html)
                .reply_markup(revealed_keyboard(&asked.options, &marks))
                .await;
            if let Err(e) = revealed {
                log::warn!("Couldn't reveal the answer in chat {}: {}", chat_id, e);
            }
        }

        match dwell_and_advance(chat_id, live).await {
            Some(Advance::Question(_)) => continue,
            Some(Advance::Finished) => break,
            Some(Advance::Stay) | None => return Ok(()),
        }
    }

    let Some((result, quiz_id, total)) = live.with_play(chat_id, |play| {
        (
            play.player.take_result(),
            play.player.quiz().id().to_owned(),
            play.player.quiz().questions().len(),
        )
    }) else {
        return Ok(());
    };
    let Some(result) = result else {
        return Ok(());
    };

    log::info!(
        "{} finished quiz {} in chat {} with {}/{}",
        result.name(),
        quiz_id,
        chat_id,
        result.score(),
        total
    );
    let summary = format!(
        "🎉 Well done, {}!\nYour score: {}/{}",
        result.name(),
        result.score(),
        total
    );
    if let Err(e) = storage.append_result(&quiz_id, result).await {
        log::error!("Saving the result for quiz {} failed: {}", quiz_id, e);
    }

    bot.send_message(chat_id, summary)
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}

/// Runs one play from the first question to the score. One task per chat.
async fn drive<D: Document>(
    bot: Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    answered: Arc<Notify>,
    storage: Arc<Storage<D>>,
    live: Arc<LiveTable>,
) {
    if let Err(e) = play_through(&bot, chat_id, &answered, &storage, &live).await {
        log::error!("Play in chat {} stopped: {}", chat_id, e);
    }
    live.finish_play(chat_id);
    if let Err(e) = dialogue.update(QuizState::Start).await {
        log::error!("Couldn't reset dialogue of chat {}: {}", chat_id, e);
    }
}

#[instrument(level = "info", skip(bot, dialogue, quiz, storage, live), fields(quiz = %quiz.id()))]
pub(crate) async fn receive_player_name<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    quiz: Quiz,
    storage: Arc<Storage<D>>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    let mut player = Player::new(quiz);

    match player.submit_name(msg.text().unwrap_or_default()) {
        Ok(()) => {
            log::info!(
                "{} starts quiz '{}' in chat {}",
                player.name(),
                player.quiz().title(),
                msg.chat.id
            );
            bot.send_message(msg.chat.id, format!("Good luck, {}! Let's begin.", player.name()))
                .await?;

            let answered = live.start_play(msg.chat.id, player);
            dialogue.update(QuizState::Playing).await?;
            let handle = tokio::spawn(drive(
                bot,
                msg.chat.id,
                dialogue,
                answered,
                storage,
                live.clone(),
            ));
            live.set_driver(msg.chat.id, handle.abort_handle());
        }
        Err(PlayError::BlankName) => {
            bot.send_message(msg.chat.id, "Please, enter your name.").await?;
        }
        Err(e) => {
            log::error!("Chat {}: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, "Something went wrong. Send /start to try again.")
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, live))]
pub(crate) async fn take_answer(bot: Bot, q: CallbackQuery, live: Arc<LiveTable>) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let (Some(chat_id), Some(option)) = (q.chat_id(), q.data.as_deref().and_then(parse_answer))
    else {
        return Ok(());
    };

    let picked = live
        .with_play(chat_id, |play| {
            let current = play.message.zip(q.message.as_ref().map(|m| m.id()));
            match current {
                Some((expected, clicked)) if expected != clicked => None,
                _ => play.player.select(option).map(|_| play.answered.clone()),
            }
        })
        .flatten();

    if let Some(answered) = picked {
        log::info!("Chat {} picked option {}", chat_id, option + 1);
        answered.notify_one();
    }
    Ok(())
}

/// While a play runs, text messages only get a reminder.
#[instrument(level = "info", skip(bot))]
pub(crate) async fn playing(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Pick an answer with the buttons above, or send /cancel to stop playing.",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::quiz::Question;

    const CHAT: ChatId = ChatId(9);

    fn started(live: &LiveTable) -> Arc<Notify> {
        let mut player = Player::new(Quiz::retreive(
            "q".into(),
            "Party".into(),
            vec![
                Question::new("One".into(), vec!["a".into(), "b".into()], 1),
                Question::new("Two".into(), vec!["a".into(), "b".into()], 0),
            ],
        ));
        player.submit_name("Ann").unwrap();
        live.start_play(CHAT, player)
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_question_times_out() {
        let live = LiveTable::default();
        let answered = started(&live);
        let mut marks = Vec::new();
        let begun = Instant::now();

        let reveal = await_reveal(CHAT, &answered, &live, |left| {
            marks.push(left);
            async {}
        })
        .await
        .unwrap();

        assert_eq!(reveal.selection, Selection::TimedOut);
        assert!(!reveal.correct);
        assert_eq!(marks, COUNTDOWN_MARKS);
        assert!(begun.elapsed() >= TICK * TIME_LIMIT);
        assert!(begun.elapsed() < TICK * (TIME_LIMIT + 1));
    }

    #[tokio::test(start_paused = true)]
    async fn leftover_permit_doesnt_end_the_question() {
        let live = Arc::new(LiveTable::default());
        let answered = started(&live);
        answered.notify_one();

        let picker = {
            let live = live.clone();
            let answered = answered.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(3500)).await;
                live.with_play(CHAT, |play| play.player.select(1));
                answered.notify_one();
            })
        };

        let reveal = await_reveal(CHAT, &answered, &live, |_| async {})
            .await
            .unwrap();
        picker.await.unwrap();

        assert_eq!(reveal.selection, Selection::Option(1));
        assert!(reveal.correct);
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_dwells_then_moves_on() {
        let live = LiveTable::default();
        let _answered = started(&live);
        live.with_play(CHAT, |play| {
            play.message = Some(teloxide::types::MessageId(3));
            play.player.select(0)
        });
        let begun = Instant::now();

        let advance = dwell_and_advance(CHAT, &live).await;

        assert_eq!(advance, Some(Advance::Question(1)));
        assert!(begun.elapsed() >= REVEAL_DWELL);
        assert_eq!(live.with_play(CHAT, |play| play.message), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn gone_play_stops_waiting() {
        let live = LiveTable::default();
        let answered = started(&live);
        live.finish_play(CHAT);

        assert_eq!(await_reveal(CHAT, &answered, &live, |_| async {}).await, None);
        assert_eq!(dwell_and_advance(CHAT, &live).await, None);
    }
}
