//! The append-only message log.
//!
//! Every turn is persisted with its token count computed once at insert
//! time; window queries never re-tokenize. Rows are never deleted, only
//! deactivated or left behind the window pointer.

use rusqlite::{OptionalExtension, params};

use chatmem_types::{MessageId, Role};

use crate::db::now_iso8601;
use crate::error::MemoryError;
use crate::store::{HistorySize, MemoryStore, StoredMessage, message_from_row};

impl MemoryStore {
    /// Append one turn to the log and return the stored row.
    ///
    /// The id is assigned by the store, strictly increasing per insert.
    /// Empty or whitespace-only content is rejected before any write.
    pub fn append(
        &mut self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, MemoryError> {
        if content.trim().is_empty() {
            return Err(MemoryError::EmptyMessage);
        }

        let token_count = self.counter.count_str(content);
        let created_at = now_iso8601();
        self.db.execute(
            "INSERT INTO messages (user_id, role, content, token_count, active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![user_id, role.as_str(), content, token_count, created_at],
        )?;
        let id = MessageId::new(self.db.last_insert_rowid());

        tracing::debug!(user = user_id, %role, %id, token_count, "appended message");

        Ok(StoredMessage {
            id,
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            token_count,
            active: true,
            created_at,
        })
    }

    /// Messages after `since` for a user, newest first.
    ///
    /// Inactive rows are excluded unless `include_inactive` is set.
    pub fn query_since(
        &self,
        user_id: &str,
        since: MessageId,
        include_inactive: bool,
    ) -> Result<Vec<StoredMessage>, MemoryError> {
        let mut stmt = self.db.prepare(
            "SELECT id, user_id, role, content, token_count, active, created_at
             FROM messages
             WHERE user_id = ?1 AND id > ?2 AND (active = 1 OR ?3)
             ORDER BY id DESC",
        )?;

        let rows = stmt.query_map(
            params![user_id, since.as_i64(), include_inactive],
            message_from_row,
        )?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Row count and raw token total of active messages after `since`.
    ///
    /// Sums over everything in range regardless of the model budget; the
    /// budget-truncated view is the window, not this.
    pub fn count_since(&self, user_id: &str, since: MessageId) -> Result<HistorySize, MemoryError> {
        let (rows, tokens) = self.db.query_row(
            "SELECT COUNT(*), COALESCE(SUM(token_count), 0)
             FROM messages
             WHERE user_id = ?1 AND id > ?2 AND active = 1",
            params![user_id, since.as_i64()],
            |row| {
                let rows: i64 = row.get(0)?;
                let tokens: i64 = row.get(1)?;
                Ok((rows, tokens))
            },
        )?;

        Ok(HistorySize {
            rows: u64::try_from(rows).unwrap_or(0),
            tokens: u64::try_from(tokens).unwrap_or(0),
        })
    }

    /// Id of the user's newest active message, if any.
    pub fn newest_active_id(&self, user_id: &str) -> Result<Option<MessageId>, MemoryError> {
        let id: Option<i64> = self
            .db
            .query_row(
                "SELECT id FROM messages
                 WHERE user_id = ?1 AND active = 1
                 ORDER BY id DESC LIMIT 1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(MessageId::new))
    }

    /// Logically delete one message. The row stays on disk but disappears
    /// from window and count queries. Returns whether a row was flipped.
    pub fn deactivate(&mut self, message_id: MessageId) -> Result<bool, MemoryError> {
        let updated = self.db.execute(
            "UPDATE messages SET active = 0 WHERE id = ?1",
            params![message_id.as_i64()],
        )?;
        Ok(updated > 0)
    }
}
