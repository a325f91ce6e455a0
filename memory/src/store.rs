//! SQLite-backed store for user settings and the message log.
//!
//! One connection, two tables. `users` holds per-user configuration and the
//! window-start pointer; `messages` is the append-only conversation log.
//! Operations are split across `settings`, `log`, and `window` by concern,
//! all as methods on [`MemoryStore`].

use std::path::Path;

use rusqlite::{Connection, Row};

use chatmem_types::{ChatModel, MessageId, Role, Temperature};

use crate::db::open_secure_db;
use crate::error::MemoryError;
use crate::token_counter::TokenCounter;

/// A user row: settings plus the window-start pointer.
///
/// Field types are validated at this boundary; a value that reaches a
/// `UserProfile` is already in-domain.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub model: ChatModel,
    pub temperature: Temperature,
    pub window_start: MessageId,
    pub created_at: String,
    pub updated_at: String,
}

/// A message row. Never mutated after insert except the `active` flag.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: MessageId,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub token_count: u32,
    pub active: bool,
    pub created_at: String,
}

/// Row and token totals for the history behind a user's window pointer.
///
/// Token totals are raw sums over active rows, independent of any model
/// budget (unlike the windowed view, which truncates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySize {
    pub rows: u64,
    pub tokens: u64,
}

/// Persistent store for per-user conversation memory.
pub struct MemoryStore {
    pub(crate) db: Connection,
    pub(crate) counter: TokenCounter,
    #[cfg(test)]
    pub(crate) budget_override: Option<u32>,
}

impl MemoryStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            temperature REAL NOT NULL,
            window_start INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            token_count INTEGER NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user_id
        ON messages(user_id, id);
    ";

    /// Open or create the history database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let db = open_secure_db(path.as_ref())?;
        Self::initialize(db)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, MemoryError> {
        let db = Connection::open_in_memory()?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self, MemoryError> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )?;
        db.execute_batch(Self::SCHEMA)?;
        Ok(Self {
            db,
            counter: TokenCounter::new(),
            #[cfg(test)]
            budget_override: None,
        })
    }

    /// Token budget for a model. Tests may pin a small budget so window
    /// truncation can be exercised without thousands of tokens of fixture
    /// text.
    pub(crate) fn budget_for(&self, model: ChatModel) -> u32 {
        #[cfg(test)]
        if let Some(budget) = self.budget_override {
            return budget;
        }
        model.max_tokens()
    }
}

/// Map a `SELECT id, user_id, role, content, token_count, active, created_at`
/// row to a [`StoredMessage`].
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    let role: String = row.get(2)?;
    let role = parse_text_column(2, &role, Role::parse)?;
    let token_count: i64 = row.get(4)?;

    Ok(StoredMessage {
        id: MessageId::new(row.get(0)?),
        user_id: row.get(1)?,
        role,
        content: row.get(3)?,
        token_count: u32::try_from(token_count).unwrap_or(0),
        active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Map a `SELECT id, model, temperature, window_start, created_at, updated_at`
/// row to a [`UserProfile`].
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let model: String = row.get(1)?;
    let model = parse_text_column(1, &model, ChatModel::parse)?;
    let raw_temperature: f64 = row.get(2)?;
    let temperature = Temperature::new(raw_temperature).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Real, Box::new(err))
    })?;

    Ok(UserProfile {
        id: row.get(0)?,
        model,
        temperature,
        window_start: MessageId::new(row.get(3)?),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Lift a domain parse failure into a column conversion error, so corrupted
/// rows surface as storage errors instead of panics or silent skips.
fn parse_text_column<T, E>(
    index: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parse(raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}
