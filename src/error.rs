use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Invalid request. 'topic' is required.")]
    MissingTopic,
    #[error("Topic cannot be empty.")]
    EmptyTopic,
    /// The question source failed; carries its message as-is.
    #[error("{0}")]
    Upstream(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please select a valid option before submitting!")]
    NoChoice,
    #[error("\"{0}\" is not one of the options. Please select a valid option before submitting!")]
    UnknownChoice(String),
    #[error("The quiz is already completed")]
    Completed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, QuizError>;
