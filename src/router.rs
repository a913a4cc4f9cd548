//! Share links and where they lead.
//!
//! Links carry their target in the URL fragment: `#/` for home,
//! `#/quiz/<payload>` to play and `#/podium/<payload>` for the results board.
//! The payload is either a share token (the whole quiz, see [`crate::codec`])
//! or a quiz id looked up in the store.

use url::Url;

use crate::{
    codec,
    store::{connection::Document, quiz::Quiz, Storage},
};

const QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizRef {
    Token(String),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Play(QuizRef),
    Podium(QuizRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// `redirected` is set when the link pointed at a quiz that couldn't be found.
    Home { redirected: bool },
    Play(Quiz),
    Podium(Quiz),
}

impl QuizRef {
    fn from_payload(payload: &str) -> Option<Self> {
        let payload = payload.trim().trim_end_matches('/');
        if payload.is_empty() {
            None
        } else if codec::is_token(payload) {
            Some(Self::Token(payload.to_owned()))
        } else {
            Some(Self::Id(payload.to_owned()))
        }
    }
}

impl Route {
    /// Accepts a full link or just its fragment. Anything unrecognised is home.
    pub fn parse(link: &str) -> Self {
        let link = link.trim();
        let fragment = match link.split_once('#') {
            Some((_, fragment)) => fragment,
            None if link.starts_with('/') => link,
            None => return Self::Home,
        };

        if let Some(payload) = fragment.strip_prefix("/quiz/") {
            QuizRef::from_payload(payload).map_or(Self::Home, Self::Play)
        } else if let Some(payload) = fragment.strip_prefix("/podium/") {
            QuizRef::from_payload(payload).map_or(Self::Home, Self::Podium)
        } else {
            Self::Home
        }
    }

    /// Telegram deep links (`?start=quiz_<id>`) can only carry ids.
    pub fn from_start_param(param: &str) -> Self {
        let param = param.trim();
        if let Some(id) = param.strip_prefix("quiz_") {
            QuizRef::from_payload(id).map_or(Self::Home, Self::Play)
        } else if let Some(id) = param.strip_prefix("podium_") {
            QuizRef::from_payload(id).map_or(Self::Home, Self::Podium)
        } else {
            Self::parse(param)
        }
    }

    /// Where a chat message leads. Anything but a link is home.
    pub fn from_message(text: Option<&str>) -> Self {
        text.map_or(Self::Home, Self::parse)
    }

    pub fn is_home(&self) -> bool {
        *self == Self::Home
    }
}

async fn find<D: Document>(quiz: QuizRef, storage: &Storage<D>) -> Option<Quiz> {
    match quiz {
        QuizRef::Token(token) => codec::decode(&token)
            .map_err(|e| log::warn!("Couldn't decode shared quiz: {}", e))
            .ok(),
        QuizRef::Id(id) => match storage.find_quiz(&id).await {
            Ok(Some(quiz)) => Some(quiz),
            Ok(None) => {
                log::info!("Quiz {} not found", id);
                None
            }
            Err(e) => {
                log::error!("Looking up quiz {} failed: {}", id, e);
                None
            }
        },
    }
}

pub async fn resolve<D: Document>(route: Route, storage: &Storage<D>) -> Screen {
    match route {
        Route::Home => Screen::Home { redirected: false },
        Route::Play(quiz) => find(quiz, storage)
            .await
            .map_or(Screen::Home { redirected: true }, Screen::Play),
        Route::Podium(quiz) => find(quiz, storage)
            .await
            .map_or(Screen::Home { redirected: true }, Screen::Podium),
    }
}

fn with_fragment(base: &Url, fragment: &str) -> Url {
    let mut url = base.clone();
    url.set_fragment(Some(fragment));
    url
}

pub fn share_url(base: &Url, quiz_id: &str) -> Url {
    with_fragment(base, &format!("/quiz/{quiz_id}"))
}

pub fn podium_url(base: &Url, quiz_id: &str) -> Url {
    with_fragment(base, &format!("/podium/{quiz_id}"))
}

/// A link that works without the store: the quiz travels inside it.
pub fn embedded_share_url(base: &Url, quiz: &Quiz) -> Url {
    with_fragment(base, &format!("/quiz/{}", codec::encode(quiz)))
}

pub fn qr_url(link: &Url) -> Url {
    Url::parse_with_params(QR_ENDPOINT, &[("size", "200x200"), ("data", link.as_str())])
        .unwrap_or_else(|_| link.clone())
}
