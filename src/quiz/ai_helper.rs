use std::future::Future;

use chatgpt::client::ChatGPT;
use chatgpt::types::CompletionResponse;
use log::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{QuizError, Result};
use crate::quiz::extract::{extract, extract_with_fallback};
use crate::quiz::QuestionRecord;

/// Something that writes quiz text for a topic.
///
/// Timeouts, retries and the like are up to the implementation; callers only
/// see the final text or an [`QuizError::Upstream`].
pub trait QuestionSource: Send + Sync + 'static {
    fn generate(&self, topic: &str, count: usize)
        -> impl Future<Output = Result<String>> + Send;
}

pub struct ChatGptSource {
    chat_gpt: ChatGPT,
}

impl ChatGptSource {
    pub fn new(config: &LlmConfig) -> std::result::Result<Self, chatgpt::err::Error> {
        let mut chat_gpt = ChatGPT::new(&config.api_key)?;

        chat_gpt.config.engine = config.engine.clone();
        chat_gpt.config.timeout = config.timeout;

        Ok(Self { chat_gpt })
    }
}

impl QuestionSource for ChatGptSource {
    async fn generate(&self, topic: &str, count: usize) -> Result<String> {
        debug!("Requesting {} questions about {:?}", count, topic);

        let mut conversation = self
            .chat_gpt
            .new_conversation_directed(direction_prompt(topic, count));
        let response: CompletionResponse = conversation
            .send_message(question_prompt(topic, count))
            .await
            .map_err(|e| QuizError::Upstream(e.to_string()))?;
        let content = response.message().content.trim().to_string();

        debug!("Completion: {:?}", content);

        Ok(content)
    }
}

fn direction_prompt(topic: &str, count: usize) -> String {
    format!(
        "You write multiple-choice quizzes. Please generate {} multiple-choice questions (MCQs) related to the topic: {}",
        count, topic
    )
}

fn question_prompt(topic: &str, count: usize) -> String {
    format!(
        "Generate {count} multiple-choice questions related to {topic}. \
        Number each question like \"1.\" and put it on its own line. \
        Include four options on separate lines, prefixed \"A)\", \"B)\", \"C)\" and \"D)\". \
        Indicate the correct answer at the end of each question on its own line as \"**Correct Answer: X**\", \
        where X is the letter of the correct option."
    )
}

/// Turns a topic into ready-to-serve questions.
pub struct QuizHelper<S> {
    source: S,
    question_count: usize,
    tolerant_parsing: bool,
}

impl<S: QuestionSource> QuizHelper<S> {
    pub fn new(source: S, question_count: usize, tolerant_parsing: bool) -> Self {
        Self {
            source,
            question_count,
            tolerant_parsing,
        }
    }

    /// Trims and validates the topic, asks the source, and parses the reply.
    ///
    /// Text that does not parse is not an error: it yields fewer questions,
    /// possibly none.
    pub async fn generate_quiz(&self, topic: &str) -> Result<Vec<QuestionRecord>> {
        let topic = validate_topic(topic)?;

        info!("Generating quiz for topic {:?}", topic);
        let text = self.source.generate(topic, self.question_count).await?;

        let questions = if self.tolerant_parsing {
            extract_with_fallback(&text, self.question_count)
        } else {
            extract(&text, self.question_count)
        };

        if questions.len() < self.question_count {
            warn!(
                "Got {} of {} requested questions for {:?}",
                questions.len(),
                self.question_count,
                topic
            );
        }
        Ok(questions)
    }
}

/// Returns the trimmed topic, rejecting blank input.
pub fn validate_topic(topic: &str) -> Result<&str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(QuizError::EmptyTopic);
    }
    Ok(topic)
}
