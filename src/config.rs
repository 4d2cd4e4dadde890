use std::net::SocketAddr;
use std::time::Duration;

use chatgpt::config::ChatGPTEngine;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "QUIZ_API";
pub const MODEL_ENV: &str = "QUIZ_MODEL";
pub const TIMEOUT_ENV: &str = "QUIZ_TIMEOUT_SECS";
pub const QUESTION_COUNT_ENV: &str = "QUIZ_QUESTION_COUNT";
pub const TOLERANT_PARSING_ENV: &str = "QUIZ_TOLERANT_PARSING";
pub const HTTP_ADDR_ENV: &str = "QUIZ_HTTP_ADDR";
pub const DB_PATH_ENV: &str = "QUIZ_DB_PATH";
pub const BOT_TOKEN_ENV: &str = "TELOXIDE_TOKEN";

const DEFAULT_QUESTION_COUNT: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_DB_PATH: &str = "db.sqlite";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub engine: ChatGPTEngine,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub question_count: usize,
    pub tolerant_parsing: bool,
    pub http_addr: SocketAddr,
    pub db_path: String,
    /// The chat bot only runs when this is set.
    pub bot_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var(API_KEY_ENV).ok_or(ConfigError::Missing(API_KEY_ENV))?;

        let engine = match var(MODEL_ENV) {
            Some(model) => parse_engine(&model).ok_or(ConfigError::Invalid {
                name: MODEL_ENV,
                value: model,
            })?,
            None => ChatGPTEngine::Gpt35Turbo,
        };

        let timeout = Duration::from_secs(parse_or(
            TIMEOUT_ENV,
            var(TIMEOUT_ENV),
            DEFAULT_TIMEOUT_SECS,
        )?);

        let question_count = parse_or(
            QUESTION_COUNT_ENV,
            var(QUESTION_COUNT_ENV),
            DEFAULT_QUESTION_COUNT,
        )?;
        if question_count == 0 {
            return Err(ConfigError::Invalid {
                name: QUESTION_COUNT_ENV,
                value: "0".to_string(),
            });
        }

        let tolerant_parsing = parse_or(TOLERANT_PARSING_ENV, var(TOLERANT_PARSING_ENV), false)?;

        let http_addr: SocketAddr = {
            let value = var(HTTP_ADDR_ENV).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: HTTP_ADDR_ENV,
                value,
            })?
        };

        Ok(Self {
            llm: LlmConfig {
                api_key,
                engine,
                timeout,
            },
            question_count,
            tolerant_parsing,
            http_addr,
            db_path: var(DB_PATH_ENV).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            bot_token: var(BOT_TOKEN_ENV),
        })
    }
}

fn parse_engine(model: &str) -> Option<ChatGPTEngine> {
    match model.trim() {
        "gpt-3.5-turbo" => Some(ChatGPTEngine::Gpt35Turbo),
        "gpt-4" => Some(ChatGPTEngine::Gpt4),
        "gpt-4-32k" => Some(ChatGPTEngine::Gpt4_32k),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
