//! Window construction: the budget-truncated slice of recent history.
//!
//! `build_window` is the one place history is trimmed. It scans the active
//! messages after the user's window-start pointer, newest first, accumulating
//! token counts against the selected model's budget. The moment a row would
//! overflow the budget, the scan stops and the pointer is pegged at that row
//! (exclusive): future calls never re-examine it or anything older. Pegging
//! is eager and one-way; it degrades context one step per call and never
//! un-pegs.
//!
//! The scan, the peg decision, and the pointer write happen inside a single
//! SQLite transaction, so a message appended concurrently can never be
//! silently excluded from the peg decision.

use rusqlite::{OptionalExtension, params};

use chatmem_types::MessageId;

use crate::db::now_iso8601;
use crate::error::MemoryError;
use crate::store::{MemoryStore, StoredMessage, message_from_row};

/// The ordered, budget-truncated message sequence for one model request.
///
/// Entries are in chronological order, ready to hand to the model call.
#[derive(Debug, Clone)]
pub struct Window {
    entries: Vec<StoredMessage>,
    total_tokens: u64,
}

impl Window {
    /// Messages in chronological order.
    #[must_use]
    pub fn entries(&self) -> &[StoredMessage] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<StoredMessage> {
        self.entries
    }

    /// Sum of `token_count` over the included messages. Always within the
    /// budget the window was built against.
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty window is legitimate: it happens when no messages exist past
    /// the pointer, or when the newest message alone exceeds the budget.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MemoryStore {
    /// Build the conversation window for a user.
    ///
    /// Fails with `UserNotFound` if the user was never initialized. When the
    /// accumulated history exceeds the model budget, the window-start pointer
    /// is durably advanced to the overflowing row before returning, so the
    /// next call starts past it.
    pub fn build_window(&mut self, user_id: &str) -> Result<Window, MemoryError> {
        let user = self.user(user_id)?;
        let budget = u64::from(self.budget_for(user.model));

        let tx = self.db.transaction()?;

        // Re-read the pointer inside the transaction; the value from the
        // profile lookup above could already be stale.
        let window_start: i64 = tx
            .query_row(
                "SELECT window_start FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| MemoryError::user_not_found(user_id))?;

        let mut entries: Vec<StoredMessage> = Vec::new();
        let mut total_tokens = 0u64;
        let mut peg: Option<MessageId> = None;

        {
            let mut stmt = tx.prepare(
                "SELECT id, user_id, role, content, token_count, active, created_at
                 FROM messages
                 WHERE user_id = ?1 AND id > ?2 AND active = 1
                 ORDER BY id DESC",
            )?;
            let rows = stmt.query_map(params![user_id, window_start], message_from_row)?;

            for row in rows {
                let message = row?;
                let with_message = total_tokens + u64::from(message.token_count);
                if with_message > budget {
                    // Budget exceeded: this row and everything older fall out
                    // of all future windows.
                    peg = Some(message.id);
                    break;
                }
                total_tokens = with_message;
                entries.push(message);
            }
        }

        if let Some(peg_id) = peg {
            tx.execute(
                "UPDATE users SET window_start = ?2, updated_at = ?3 WHERE id = ?1",
                params![user_id, peg_id.as_i64(), now_iso8601()],
            )?;
            tracing::info!(
                user = user_id,
                window_start = %peg_id,
                total_tokens,
                budget,
                "token budget exceeded; pegged window start"
            );
        }

        tx.commit()?;

        // The scan collected newest-to-oldest; the model wants chronological.
        entries.reverse();
        Ok(Window {
            entries,
            total_tokens,
        })
    }

    /// Discard all prior context from future windows by pegging the pointer
    /// at the newest active message. No-op when the user has no messages.
    /// The underlying rows are untouched.
    pub fn reset(&mut self, user_id: &str) -> Result<(), MemoryError> {
        let tx = self.db.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(MemoryError::user_not_found(user_id));
        }

        let newest: Option<i64> = tx
            .query_row(
                "SELECT id FROM messages
                 WHERE user_id = ?1 AND active = 1
                 ORDER BY id DESC LIMIT 1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(newest_id) = newest {
            tx.execute(
                "UPDATE users SET window_start = ?2, updated_at = ?3 WHERE id = ?1",
                params![user_id, newest_id, now_iso8601()],
            )?;
            tracing::info!(user = user_id, window_start = newest_id, "reset window");
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chatmem_types::{ChatModel, MessageId, Role};

    use crate::error::MemoryError;
    use crate::store::{MemoryStore, StoredMessage};

    fn store_with_user() -> MemoryStore {
        let mut store = MemoryStore::open_in_memory().expect("in-memory store");
        store.ensure_user("U100", ChatModel::Gpt4).expect("create");
        store
    }

    /// Three identical messages so each row costs the same token count.
    fn append_three(store: &mut MemoryStore) -> Vec<StoredMessage> {
        (0..3)
            .map(|_| {
                store
                    .append("U100", Role::User, "the same ten tokens or so")
                    .expect("append")
            })
            .collect()
    }

    #[test]
    fn unknown_user_fails_with_user_not_found() {
        let mut store = MemoryStore::open_in_memory().expect("in-memory store");
        assert!(matches!(
            store.build_window("ghost"),
            Err(MemoryError::UserNotFound { .. })
        ));
        assert!(matches!(
            store.reset("ghost"),
            Err(MemoryError::UserNotFound { .. })
        ));
    }

    #[test]
    fn under_budget_returns_everything_chronological() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);

        let window = store.build_window("U100").expect("window");
        assert_eq!(window.len(), 3);
        assert_eq!(window.entries()[0].id, messages[0].id);
        assert_eq!(window.entries()[2].id, messages[2].id);

        // No overflow, so the pointer must not move.
        assert_eq!(
            store.window_start("U100").expect("pointer"),
            MessageId::ORIGIN
        );
    }

    #[test]
    fn overflow_keeps_the_two_newest_and_pegs_before_the_oldest() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);
        let per_message = u64::from(messages[0].token_count);

        // Budget fits exactly two messages; the third (oldest) overflows.
        store.budget_override = Some(u32::try_from(per_message * 2).expect("small budget"));

        let window = store.build_window("U100").expect("window");
        assert_eq!(window.len(), 2);
        assert_eq!(window.entries()[0].id, messages[1].id);
        assert_eq!(window.entries()[1].id, messages[2].id);
        assert_eq!(window.total_tokens(), per_message * 2);

        // Pegged at the overflowing row, exclusive.
        assert_eq!(
            store.window_start("U100").expect("pointer"),
            messages[0].id
        );
    }

    #[test]
    fn window_never_exceeds_the_budget() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);
        let per_message = u64::from(messages[0].token_count);
        store.budget_override = Some(u32::try_from(per_message * 2 + 1).expect("small budget"));

        for _ in 0..3 {
            let window = store.build_window("U100").expect("window");
            assert!(window.total_tokens() <= per_message * 2 + 1);
            store
                .append("U100", Role::Assistant, "the same ten tokens or so")
                .expect("append");
        }
    }

    #[test]
    fn pegged_rows_never_reappear() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);
        let per_message = u64::from(messages[0].token_count);
        store.budget_override = Some(u32::try_from(per_message * 2).expect("small budget"));

        store.build_window("U100").expect("first window");
        let pegged_at = store.window_start("U100").expect("pointer");
        assert_eq!(pegged_at, messages[0].id);

        // Keep the conversation going; every subsequent window must stay
        // strictly past the peg, and the pointer only moves forward.
        for _ in 0..4 {
            store
                .append("U100", Role::User, "the same ten tokens or so")
                .expect("append");
            let window = store.build_window("U100").expect("window");
            for entry in window.entries() {
                assert!(entry.id > pegged_at);
            }
            assert!(store.window_start("U100").expect("pointer") >= pegged_at);
        }
    }

    #[test]
    fn newest_message_alone_over_budget_yields_empty_window() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);
        let per_message = messages[0].token_count;
        store.budget_override = Some(per_message - 1);

        let window = store.build_window("U100").expect("window");
        assert!(window.is_empty());
        assert_eq!(window.total_tokens(), 0);

        // Pegged at the newest row: everything is out of future windows.
        assert_eq!(
            store.window_start("U100").expect("pointer"),
            messages[2].id
        );
        let next = store.build_window("U100").expect("window");
        assert!(next.is_empty());
    }

    #[test]
    fn inactive_rows_are_skipped() {
        let mut store = store_with_user();
        let messages = append_three(&mut store);

        store.deactivate(messages[1].id).expect("deactivate");

        let window = store.build_window("U100").expect("window");
        assert_eq!(window.len(), 2);
        assert!(window.entries().iter().all(|entry| entry.id != messages[1].id));
    }

    #[test]
    fn reset_pegs_at_the_newest_message() {
        let mut store = store_with_user();
        let mut last_id = MessageId::ORIGIN;
        for i in 0..5 {
            last_id = store
                .append("U100", Role::User, &format!("message {i}"))
                .expect("append")
                .id;
        }

        store.reset("U100").expect("reset");
        assert_eq!(store.window_start("U100").expect("pointer"), last_id);

        let window = store.build_window("U100").expect("window");
        assert!(window.is_empty());

        // The rows are still there, just behind the pointer.
        let all = store
            .query_since("U100", MessageId::ORIGIN, false)
            .expect("query");
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn reset_without_messages_is_a_noop() {
        let mut store = store_with_user();
        store.reset("U100").expect("reset");
        assert_eq!(
            store.window_start("U100").expect("pointer"),
            MessageId::ORIGIN
        );
    }
}
