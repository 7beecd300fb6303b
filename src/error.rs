#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PmtuiError {
    #[error("please provide a {0}")]
    MissingField(&'static str),

    #[error("no task selected to save")]
    NoTaskSelected,

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("note '{0}' not found")]
    NoteNotFound(String),

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("{0}")]
    Other(String),
}
