use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock},
};

use teloxide::types::ChatId;

/// Which chats are logged in as administrator. Lives as long as the bot
/// process; `/logout` clears a chat.
pub struct AdminSessions {
    password: String,
    chats: RwLock<HashSet<ChatId>>,
}

impl AdminSessions {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            chats: RwLock::default(),
        }
    }

    pub fn login(&self, chat: ChatId, attempt: &str) -> bool {
        if attempt.trim() != self.password {
            log::info!("Rejected admin login from chat {}", chat);
            return false;
        }
        self.chats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat);
        log::info!("Chat {} logged in as admin", chat);
        true
    }

    pub fn logout(&self, chat: ChatId) {
        self.chats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat);
    }

    pub fn is_admin(&self, chat: ChatId) -> bool {
        self.chats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_lifecycle() {
        let sessions = AdminSessions::new("1234");
        let chat = ChatId(5);

        assert!(!sessions.login(chat, "4321"));
        assert!(!sessions.is_admin(chat));

        assert!(sessions.login(chat, " 1234 "));
        assert!(sessions.is_admin(chat));
        assert!(!sessions.is_admin(ChatId(6)));

        sessions.logout(chat);
        assert!(!sessions.is_admin(chat));
    }
}
