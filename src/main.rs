use std::sync::Arc;

use dotenvy::dotenv;
use quizparty::{
    config::Settings,
    live::LiveTable,
    schema::schema,
    session::AdminSessions,
    state::QuizState,
    store::{connection::JsonBin, Storage},
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::IgnoringErrorHandlerSafe,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let settings = Settings::from_env()?;

    let level = settings.log_level.parse::<Level>().unwrap_or(Level::ERROR);
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(level))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_ansi(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let storage = match settings.store.clone().and_then(|config| JsonBin::connect(&config)) {
        Ok(bin) => Storage::new(bin),
        Err(e) => {
            log::error!("Persistence disabled: {}", e);
            Storage::unconfigured()
        }
    };

    let bot = Bot::new(&settings.teloxide_token);
    log::info!("Starting bot...");

    let webhook = settings.webhook.clone();
    let sessions = Arc::new(AdminSessions::new(settings.admin_password.clone()));

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            Arc::new(storage),
            sessions,
            Arc::new(LiveTable::default()),
            Arc::new(settings)
        ])
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = webhook {
        let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }

    Ok(())
}
