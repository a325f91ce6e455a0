//! Supported chat models and their token budgets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The set of models a user may select.
///
/// Every variant carries a fixed maximum token budget; the window manager
/// truncates history against it. Names round-trip through [`ChatModel::as_str`]
/// and [`ChatModel::parse`], which is also the spelling persisted in the
/// `users.model` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChatModel {
    Gpt35Turbo,
    #[default]
    Gpt4,
    Gpt4_32k,
}

/// Canonical model names, for error messages and help text.
pub const SUPPORTED_MODEL_NAMES: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4-32k"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported model '{raw}'; expected one of: {SUPPORTED_MODEL_NAMES:?}")]
pub struct UnknownModelError {
    raw: String,
}

impl UnknownModelError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl ChatModel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt4 => "gpt-4",
            ChatModel::Gpt4_32k => "gpt-4-32k",
        }
    }

    /// Maximum total token count this model accepts across all messages in
    /// one request.
    #[must_use]
    pub const fn max_tokens(self) -> u32 {
        match self {
            ChatModel::Gpt35Turbo => 4096,
            ChatModel::Gpt4 => 8192,
            ChatModel::Gpt4_32k => 32_768,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, UnknownModelError> {
        match raw.trim() {
            "gpt-3.5-turbo" => Ok(ChatModel::Gpt35Turbo),
            "gpt-4" => Ok(ChatModel::Gpt4),
            "gpt-4-32k" => Ok(ChatModel::Gpt4_32k),
            other => Err(UnknownModelError {
                raw: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatModel {
    type Err = UnknownModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatModel::parse(s)
    }
}

impl TryFrom<String> for ChatModel {
    type Error = UnknownModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChatModel::parse(&value)
    }
}

impl From<ChatModel> for String {
    fn from(model: ChatModel) -> Self {
        model.as_str().to_string()
    }
}
