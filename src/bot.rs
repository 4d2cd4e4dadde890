use std::sync::Arc;

use log::{info, warn};
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode},
    utils::html,
};

use crate::quiz::ai_helper::{validate_topic, QuestionSource, QuizHelper};
use crate::quiz::session::{QuizSession, Submission};
use crate::quiz::QuestionRecord;

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type QuizStorage = Arc<ErasedStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    AwaitingTopic,
    InProgress {
        session: QuizSession,
    },
}

const GREETING_TEXT: &str = "Welcome to the Quiz Game! I generate multiple-choice quiz questions on a topic of your choice.";
const TOPIC_PROMPT: &str = "Enter the topic for the quiz (e.g. 'Science', 'History'):";
const EMPTY_TOPIC_WARNING: &str = "Please enter a topic.";

pub async fn open_storage(path: &str) -> Result<QuizStorage, Box<dyn std::error::Error + Send + Sync>> {
    let storage = SqliteStorage::open(path, Json).await?.erase();
    Ok(storage)
}

pub async fn run<S: QuestionSource>(bot: Bot, helper: Arc<QuizHelper<S>>, storage: QuizStorage) {
    info!("Starting quiz bot...");

    Dispatcher::builder(bot, schema(helper))
        .dependencies(dptree::deps![storage])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema<S: QuestionSource>(
    helper: Arc<QuizHelper<S>>,
) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::AwaitingTopic].endpoint(
            move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                receive_topic(helper.clone(), bot, dialogue, msg)
            },
        ))
        .branch(dptree::case![State::InProgress { session }].endpoint(submit_answer))
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    bot.send_message(msg.chat.id, TOPIC_PROMPT).await?;

    dialogue.update(State::AwaitingTopic).await?;
    Ok(())
}

async fn receive_topic<S: QuestionSource>(
    helper: Arc<QuizHelper<S>>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let Ok(topic) = validate_topic(msg.text().unwrap_or_default()) else {
        bot.send_message(msg.chat.id, EMPTY_TOPIC_WARNING).await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Generating questions, please wait...")
        .reply_markup(KeyboardRemove::new())
        .await?;
    // Only cosmetic, so a failure here is ignored
    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    let questions = match helper.generate_quiz(topic).await {
        Ok(questions) => questions,
        Err(e) => {
            warn!("Quiz generation for chat {} failed: {}", msg.chat.id.0, e);
            bot.send_message(
                msg.chat.id,
                format!("Could not generate the quiz: {}\n\n{}", e, TOPIC_PROMPT),
            )
            .await?;
            return Ok(());
        }
    };

    info!(
        "Chat {} starts a quiz on {:?} with {} question(s)",
        msg.chat.id.0,
        topic,
        questions.len()
    );
    advance(bot, dialogue, msg.chat.id, QuizSession::new(questions)).await
}

async fn submit_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    let choice = msg.text().map(str::trim);

    match session.submit(choice) {
        Ok(Submission { correct: true, .. }) => {
            bot.send_message(msg.chat.id, "Correct!").await?;
        }
        Ok(Submission { correct_answer, .. }) => {
            bot.send_message(
                msg.chat.id,
                format!("Incorrect. The correct answer was: {}", correct_answer),
            )
            .await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    }

    advance(bot, dialogue, msg.chat.id, session).await
}

/// Shows the current question, or the final score once the session is done.
async fn advance(
    bot: Bot,
    dialogue: QuizDialogue,
    chat_id: ChatId,
    session: QuizSession,
) -> HandlerResult {
    let Some(question) = session.current() else {
        info!(
            "Chat {} completed a quiz: {}/{} after {} answer(s)",
            chat_id.0,
            session.score(),
            session.total(),
            session.answered().len()
        );
        bot.send_message(chat_id, completion_text(&session))
            .reply_markup(KeyboardRemove::new())
            .await?;
        bot.send_message(chat_id, TOPIC_PROMPT).await?;

        dialogue.update(State::AwaitingTopic).await?;
        return Ok(());
    };

    bot.send_message(chat_id, question_text(session.current_index(), question))
        .parse_mode(ParseMode::Html)
        .reply_markup(answer_keyboard(question))
        .await?;

    dialogue.update(State::InProgress { session }).await?;
    Ok(())
}

fn question_text(index: usize, question: &QuestionRecord) -> String {
    let options = question
        .options()
        .iter()
        .map(|(label, value)| format!("{}) {}", label, html::escape(value)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<b>Question {}:</b> {}\n\n{}\n\nChoose your answer for Question {}:",
        index + 1,
        html::escape(question.text()),
        options,
        index + 1
    )
}

fn answer_keyboard(question: &QuestionRecord) -> KeyboardMarkup {
    KeyboardMarkup::new(
        question
            .options()
            .iter()
            .map(|(_, value)| vec![KeyboardButton::new(value)])
            .collect::<Vec<_>>(),
    )
}

fn completion_text(session: &QuizSession) -> String {
    format!(
        "Quiz Completed!\nYour final score: {}/{}",
        session.score(),
        session.total()
    )
}
