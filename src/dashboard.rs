use std::sync::Arc;

use teloxide::{
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::Requester,
    types::{ChatId, InputFile, Message, ParseMode, ReplyMarkup},
    utils::html::escape,
    Bot,
};
use tracing::instrument;
use url::Url;

use crate::{
    config::Settings,
    draft::{self, QuizDraft, EDITOR_USAGE},
    keyboard::{
        dashboard_keyboard, edit_quiz_keyboard, parse_quiz_choice, quizes_keyboard,
        yes_no_keyboard, BACK, CREATE_QUIZ, DELETE, EDIT, MY_QUIZZES, PODIUM, SHARE,
    },
    live::LiveTable,
    podium,
    router::{self, Route, Screen},
    session::AdminSessions,
    state::QuizState,
    store::{connection::Document, quiz::Quiz, Storage},
    HandlerResult, UserDialogue,
};

pub(crate) const CONFIG_ERROR: &str = "⚠️ Configuration error

Podium and score saving are disabled: the storage service credentials are missing.

Set JSONBIN_API_KEY (the X-Master-Key of your bin) and JSONBIN_BIN_ID (the id in the bin URL) in the bot's environment or .env file, then restart the bot.";

/// The home screen: the dashboard for administrators, the login prompt for
/// everybody else.
pub(crate) async fn show_home<D: Document>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    storage: &Storage<D>,
    sessions: &AdminSessions,
) -> HandlerResult {
    if !storage.is_configured() {
        bot.send_message(chat_id, CONFIG_ERROR)
            .reply_markup(ReplyMarkup::kb_remove())
            .await?;
        dialogue.update(QuizState::Start).await?;
    } else if sessions.is_admin(chat_id) {
        show_dashboard(bot, chat_id, dialogue).await?;
    } else {
        bot.send_message(
            chat_id,
            "🎉 Quiz Party\nAdministrator area. Please send the access code.\n\nGot a quiz link? Just send it here to play.",
        )
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
        dialogue.update(QuizState::ReceivePassword).await?;
    }
    Ok(())
}

pub(crate) async fn show_dashboard(bot: &Bot, chat_id: ChatId, dialogue: &UserDialogue) -> HandlerResult {
    bot.send_message(chat_id, "🎉 Quiz Party dashboard. What do you want to do?")
        .reply_markup(dashboard_keyboard())
        .await?;
    dialogue.update(QuizState::Dashboard).await?;
    Ok(())
}

/// Follows a link: resolves its quiz and opens the screen it names.
#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn navigate<D: Document>(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    route: Route,
    storage: Arc<Storage<D>>,
    sessions: &AdminSessions,
    live: &LiveTable,
) -> HandlerResult {
    live.teardown(chat_id);

    if !storage.is_configured() {
        return show_home(bot, chat_id, dialogue, &storage, sessions).await;
    }

    match router::resolve(route, &storage).await {
        Screen::Home { redirected } => {
            if redirected {
                bot.send_message(chat_id, "Sorry, that quiz couldn't be found.")
                    .await?;
            }
            show_home(bot, chat_id, dialogue, &storage, sessions).await?;
        }
        Screen::Play(quiz) => {
            log::info!("Chat {} opens quiz '{}'", chat_id, quiz.title());
            bot.send_message(
                chat_id,
                format!(
                    "Welcome to the quiz\n<b>{}</b>\n\n{} questions, {} seconds each. What's your name?",
                    escape(quiz.title()),
                    quiz.questions().len(),
                    crate::player::TIME_LIMIT
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(ReplyMarkup::kb_remove())
            .await?;
            dialogue
                .update(QuizState::ReceivePlayerName { quiz })
                .await?;
        }
        Screen::Podium(quiz) => {
            podium::open(bot, chat_id, dialogue, quiz, storage, live).await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn receive_password<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    match msg.text() {
        Some(text) if text.contains('#') => {
            navigate(&bot, msg.chat.id, &dialogue, Route::parse(text), storage, &sessions, &live).await?;
        }
        Some(password) => {
            if sessions.login(msg.chat.id, password) {
                show_dashboard(&bot, msg.chat.id, &dialogue).await?;
            } else {
                bot.send_message(msg.chat.id, "Wrong access code.").await?;
            }
        }
        None => {
            bot.send_message(msg.chat.id, "Please, send the access code.")
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, storage))]
pub(crate) async fn choose_what_to_do<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
) -> HandlerResult {
    match msg.text() {
        Some(CREATE_QUIZ) => {
            log::info!("Chat {} chooses to create a new quiz.", msg.chat.id);
            let draft = QuizDraft::create();
            bot.send_message(msg.chat.id, draft::render(&draft))
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            bot.send_message(msg.chat.id, EDITOR_USAGE).await?;
            dialogue.update(QuizState::Editing { draft }).await?;
        }
        Some(MY_QUIZZES) => {
            let quizzes = match storage.quizzes().await {
                Ok(quizzes) => quizzes,
                Err(e) => {
                    log::error!("Loading quizzes failed: {}", e);
                    bot.send_message(msg.chat.id, "Couldn't load your quizzes. Please try again.")
                        .await?;
                    return Ok(());
                }
            };
            if quizzes.is_empty() {
                bot.send_message(msg.chat.id, "You haven't created any quiz yet.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "Please, choose a quiz:")
                    .reply_markup(quizes_keyboard(&quizzes))
                    .await?;
                dialogue.update(QuizState::SelectQuiz { quizzes }).await?;
            }
        }
        other => {
            log::info!("Invalid message {:?} from {}", other, msg.chat.id);
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(dashboard_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, quizzes))]
pub(crate) async fn select_quiz(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    quizzes: Vec<Quiz>,
) -> HandlerResult {
    match msg.text() {
        Some(BACK) => show_dashboard(&bot, msg.chat.id, &dialogue).await?,
        Some(text) => {
            let chosen = parse_quiz_choice(text)
                .and_then(|i| quizzes.get(i))
                .or_else(|| quizzes.iter().find(|quiz| quiz.title() == text));
            match chosen {
                Some(quiz) => {
                    bot.send_message(msg.chat.id, quiz.to_string())
                        .parse_mode(ParseMode::Html)
                        .reply_markup(edit_quiz_keyboard())
                        .await?;
                    dialogue
                        .update(QuizState::HandleQuiz { quiz: quiz.clone() })
                        .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, format!("Quiz '{}' not found.", text))
                        .await?;
                }
            }
        }
        None => {
            bot.send_message(msg.chat.id, "Please, choose a quiz.").await?;
        }
    }
    Ok(())
}

/// Telegram rejects longer text messages.
const MESSAGE_LIMIT: usize = 4096;

/// The link messages for a quiz. The self-contained link grows with the quiz
/// and is replaced by a note when it can't fit in one message.
fn share_messages(base: &Url, quiz: &Quiz) -> Vec<String> {
    let links = format!(
        "Player link:\n{}\n\nPodium:\n{}",
        router::share_url(base, quiz.id()),
        router::podium_url(base, quiz.id())
    );

    let embedded = format!(
        "Self-contained link (works without the store):\n{}",
        router::embedded_share_url(base, quiz)
    );
    let embedded = if embedded.chars().count() <= MESSAGE_LIMIT {
        embedded
    } else {
        "This quiz is too large for a self-contained link. Use the player link above.".to_owned()
    };

    vec![links, embedded]
}

async fn share(bot: &Bot, chat_id: ChatId, quiz: &Quiz, settings: &Settings) -> HandlerResult {
    let link = router::share_url(&settings.public_url, quiz.id());

    bot.send_photo(chat_id, InputFile::url(router::qr_url(&link)))
        .caption(format!(
            "{}\nYour guests can scan this code to play!",
            quiz.title()
        ))
        .await?;
    for text in share_messages(&settings.public_url, quiz) {
        bot.send_message(chat_id, text).await?;
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, quiz, storage, sessions, live, settings))]
pub(crate) async fn handle_quiz<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    quiz: Quiz,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
    settings: Arc<Settings>,
) -> HandlerResult {
    match msg.text() {
        Some(SHARE) => share(&bot, msg.chat.id, &quiz, &settings).await?,
        Some(PODIUM) => {
            navigate(
                &bot,
                msg.chat.id,
                &dialogue,
                Route::Podium(router::QuizRef::Id(quiz.id().to_owned())),
                storage,
                &sessions,
                &live,
            )
            .await?;
        }
        Some(EDIT) => {
            log::info!("Chat {} edits quiz '{}'", msg.chat.id, quiz.title());
            let draft = QuizDraft::edit(&quiz);
            bot.send_message(msg.chat.id, draft::render(&draft))
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            bot.send_message(msg.chat.id, EDITOR_USAGE).await?;
            dialogue.update(QuizState::Editing { draft }).await?;
        }
        Some(DELETE) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Delete '{}'? Its podium will be erased too. This can't be undone.",
                    quiz.title()
                ),
            )
            .reply_markup(yes_no_keyboard())
            .await?;
            dialogue.update(QuizState::ConfirmDelete { quiz }).await?;
        }
        Some(BACK) => show_dashboard(&bot, msg.chat.id, &dialogue).await?,
        _ => {
            bot.send_message(msg.chat.id, "Invalid input. Try again.")
                .reply_markup(edit_quiz_keyboard())
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, quiz, storage))]
pub(crate) async fn confirm_delete<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    quiz: Quiz,
    storage: Arc<Storage<D>>,
) -> HandlerResult {
    match msg.text() {
        Some("Yes") | Some("Yes✔️") => {
            match storage.delete_quiz(quiz.id()).await {
                Ok(remaining) => {
                    log::info!(
                        "Chat {} deleted quiz '{}', {} left",
                        msg.chat.id,
                        quiz.title(),
                        remaining.len()
                    );
                    bot.send_message(msg.chat.id, format!("Quiz '{}' deleted.", quiz.title()))
                        .await?;
                }
                Err(e) => {
                    log::error!("Deleting quiz {} failed: {}", quiz.id(), e);
                    bot.send_message(
                        msg.chat.id,
                        "Something went wrong while deleting the quiz. Please try again.",
                    )
                    .await?;
                }
            }
            show_dashboard(&bot, msg.chat.id, &dialogue).await?;
        }
        Some("No") | Some("No❌") => {
            bot.send_message(msg.chat.id, "OK, keeping it.")
                .reply_markup(edit_quiz_keyboard())
                .await?;
            dialogue.update(QuizState::HandleQuiz { quiz }).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, answer Yes or No.")
                .reply_markup(yes_no_keyboard())
                .await?;
        }
    }
    Ok(())
}

/// Messages outside any screen: links are followed, anything else goes home.
#[instrument(level = "info", skip(bot, dialogue, storage, sessions, live))]
pub(crate) async fn idle<D: Document>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    storage: Arc<Storage<D>>,
    sessions: Arc<AdminSessions>,
    live: Arc<LiveTable>,
) -> HandlerResult {
    let route = Route::from_message(msg.text());
    if route.is_home() {
        show_home(&bot, msg.chat.id, &dialogue, &storage, &sessions).await
    } else {
        navigate(&bot, msg.chat.id, &dialogue, route, storage, &sessions, &live).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::quiz::Question;

    fn quiz(questions: usize) -> Quiz {
        let questions = (0..questions)
            .map(|i| {
                Question::new(
                    format!("Question number {i}: who ate the last slice of cake?"),
                    vec![
                        "Uncle Bob, obviously".into(),
                        "The dog".into(),
                        "Nobody, it's still in the fridge".into(),
                        "Me".into(),
                    ],
                    i % 4,
                )
            })
            .collect();
        Quiz::retreive("1729".into(), "Birthday".into(), questions)
    }

    fn base() -> Url {
        Url::parse("https://quiz.party/").unwrap()
    }

    #[test]
    fn small_quiz_gets_every_link() {
        let messages = share_messages(&base(), &quiz(1));

        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("https://quiz.party/#/quiz/1729"));
        assert!(messages[0].contains("https://quiz.party/#/podium/1729"));
        assert!(messages[1].contains("#/quiz/%7B"));
    }

    #[test]
    fn large_quiz_leaves_out_self_contained_link() {
        let messages = share_messages(&base(), &quiz(20));

        assert!(messages
            .iter()
            .all(|text| text.chars().count() <= MESSAGE_LIMIT));
        assert!(messages[0].contains("#/quiz/1729"));
        assert!(!messages[1].contains("%7B"));
        assert!(messages[1].contains("too large"));
    }
}
