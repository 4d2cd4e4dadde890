mod bot;
mod config;
mod error;
mod http;
mod quiz;

use std::sync::Arc;

use dotenv::dotenv;
use log::{debug, info, warn};
use quiz::ai_helper::{ChatGptSource, QuizHelper};
use teloxide::Bot;
use tokio::net::TcpListener;

use crate::config::Config;

#[tokio::main]
async fn main() -> bot::HandlerResult {
    pretty_env_logger::init();
    if let Err(e) = dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;
    info!("Starting quiz service...");

    let quiz_helper = Arc::new(QuizHelper::new(
        ChatGptSource::new(&config.llm)?,
        config.question_count,
        config.tolerant_parsing,
    ));

    let listener = TcpListener::bind(config.http_addr).await?;
    let server = tokio::spawn(http::serve(listener, quiz_helper.clone()));

    match config.bot_token {
        Some(token) => {
            info!("Establishing connection to the database...");
            let storage = bot::open_storage(&config.db_path).await?;
            info!("Connection established");

            bot::run(Bot::new(token), quiz_helper, storage).await;
            // Both sides stop on Ctrl-C
            server.await??;
        }
        None => {
            warn!("TELOXIDE_TOKEN is not set, running the HTTP endpoint only");
            server.await??;
        }
    }

    info!("Bye");
    Ok(())
}
