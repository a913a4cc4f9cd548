use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use teloxide::types::{ChatId, MessageId};
use tokio::{sync::Notify, task::AbortHandle};

use crate::player::Player;

pub struct LivePlay {
    pub player: Player,
    pub message: Option<MessageId>,
    pub answered: Arc<Notify>,
}

// Locks are never held across an `.await`.
#[derive(Default)]
pub struct LiveTable {
    plays: Mutex<HashMap<ChatId, LivePlay>>,
    drivers: Mutex<HashMap<ChatId, AbortHandle>>,
    boards: Mutex<HashMap<ChatId, AbortHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn replace(tasks: &Mutex<HashMap<ChatId, AbortHandle>>, chat: ChatId, handle: AbortHandle) {
    if let Some(previous) = lock(tasks).insert(chat, handle) {
        previous.abort();
    }
}

fn abort(tasks: &Mutex<HashMap<ChatId, AbortHandle>>, chat: ChatId) {
    if let Some(handle) = lock(tasks).remove(&chat) {
        handle.abort();
    }
}

impl LiveTable {
    pub fn start_play(&self, chat: ChatId, player: Player) -> Arc<Notify> {
        let answered = Arc::new(Notify::new());
        lock(&self.plays).insert(
            chat,
            LivePlay {
                player,
                message: None,
                answered: answered.clone(),
            },
        );
        answered
    }

    pub fn with_play<R>(&self, chat: ChatId, f: impl FnOnce(&mut LivePlay) -> R) -> Option<R> {
        lock(&self.plays).get_mut(&chat).map(f)
    }

    pub fn has_play(&self, chat: ChatId) -> bool {
        lock(&self.plays).contains_key(&chat)
    }

    pub fn set_driver(&self, chat: ChatId, handle: AbortHandle) {
        replace(&self.drivers, chat, handle);
    }

    /// Doesn't abort the driver, which calls this on its way out.
    pub fn finish_play(&self, chat: ChatId) {
        lock(&self.plays).remove(&chat);
        lock(&self.drivers).remove(&chat);
    }

    pub fn set_board(&self, chat: ChatId, handle: AbortHandle) {
        replace(&self.boards, chat, handle);
    }

    pub fn clear_board(&self, chat: ChatId) {
        abort(&self.boards, chat);
    }

    pub fn teardown(&self, chat: ChatId) {
        abort(&self.drivers, chat);
        abort(&self.boards, chat);
        lock(&self.plays).remove(&chat);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::quiz::{Question, Quiz};

    fn player() -> Player {
        Player::new(Quiz::retreive(
            "q".into(),
            "T".into(),
            vec![Question::new("Q".into(), vec!["a".into(), "b".into()], 0)],
        ))
    }

    #[tokio::test]
    async fn teardown_aborts_tasks_and_drops_play() {
        let live = LiveTable::default();
        let chat = ChatId(42);
        live.start_play(chat, player());
        let driver = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));
        let board = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));
        live.set_driver(chat, driver.abort_handle());
        live.set_board(chat, board.abort_handle());

        live.teardown(chat);

        assert!(driver.await.unwrap_err().is_cancelled());
        assert!(board.await.unwrap_err().is_cancelled());
        assert!(!live.has_play(chat));
    }

    #[tokio::test]
    async fn new_board_replaces_old_one() {
        let live = LiveTable::default();
        let chat = ChatId(7);
        let first = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));
        let second = tokio::spawn(tokio::time::sleep(Duration::from_secs(3600)));

        live.set_board(chat, first.abort_handle());
        live.set_board(chat, second.abort_handle());

        assert!(first.await.unwrap_err().is_cancelled());
        live.clear_board(chat);
        assert!(second.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn plays_are_per_chat() {
        let live = LiveTable::default();
        live.start_play(ChatId(1), player());

        let picked = live.with_play(ChatId(1), |play| {
            play.player.submit_name("Ann").unwrap();
            play.player.select(0)
        });

        assert!(picked.flatten().unwrap().correct);
        assert_eq!(live.with_play(ChatId(2), |_| ()), None);
        live.finish_play(ChatId(1));
        assert!(!live.has_play(ChatId(1)));
    }
}
