//! Per-user settings: selected model, temperature, window-start pointer.

use rusqlite::{OptionalExtension, params};

use chatmem_types::{ChatModel, MessageId, Temperature};

use crate::db::now_iso8601;
use crate::error::MemoryError;
use crate::store::{MemoryStore, UserProfile, user_from_row};

const SELECT_USER: &str = "SELECT id, model, temperature, window_start, created_at, updated_at
     FROM users WHERE id = ?1";

impl MemoryStore {
    /// Create the user row with defaults if absent; return the row either way.
    ///
    /// Idempotent: a second call leaves an existing row untouched.
    pub fn ensure_user(
        &mut self,
        user_id: &str,
        default_model: ChatModel,
    ) -> Result<UserProfile, MemoryError> {
        let now = now_iso8601();
        let inserted = self.db.execute(
            "INSERT OR IGNORE INTO users (id, model, temperature, window_start, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![
                user_id,
                default_model.as_str(),
                Temperature::DEFAULT.value(),
                now
            ],
        )?;
        if inserted > 0 {
            tracing::info!(user = user_id, model = %default_model, "created user");
        }

        self.user(user_id)
    }

    /// Fetch the user row, or `UserNotFound` if it was never initialized.
    pub fn user(&self, user_id: &str) -> Result<UserProfile, MemoryError> {
        self.db
            .query_row(SELECT_USER, params![user_id], user_from_row)
            .optional()?
            .ok_or_else(|| MemoryError::user_not_found(user_id))
    }

    /// The user's selected model; its budget is `model.max_tokens()`.
    pub fn user_model(&self, user_id: &str) -> Result<ChatModel, MemoryError> {
        Ok(self.user(user_id)?.model)
    }

    pub fn set_model(&mut self, user_id: &str, model: ChatModel) -> Result<(), MemoryError> {
        let updated = self.db.execute(
            "UPDATE users SET model = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id, model.as_str(), now_iso8601()],
        )?;
        if updated == 0 {
            return Err(MemoryError::user_not_found(user_id));
        }

        tracing::info!(user = user_id, model = %model, "updated selected model");
        Ok(())
    }

    pub fn user_temperature(&self, user_id: &str) -> Result<Temperature, MemoryError> {
        Ok(self.user(user_id)?.temperature)
    }

    /// Persist an already-validated temperature. Range checking happened in
    /// [`Temperature::new`], before anything touches storage.
    pub fn set_temperature(
        &mut self,
        user_id: &str,
        temperature: Temperature,
    ) -> Result<(), MemoryError> {
        let updated = self.db.execute(
            "UPDATE users SET temperature = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id, temperature.value(), now_iso8601()],
        )?;
        if updated == 0 {
            return Err(MemoryError::user_not_found(user_id));
        }

        tracing::info!(user = user_id, temperature = %temperature, "updated temperature");
        Ok(())
    }

    /// The oldest message id still eligible for the user's window, exclusive.
    pub fn window_start(&self, user_id: &str) -> Result<MessageId, MemoryError> {
        Ok(self.user(user_id)?.window_start)
    }

    /// Move the window-start pointer.
    ///
    /// Precondition: callers must never move the pointer backward. The store
    /// does not enforce monotonicity; a backward move is a caller bug and
    /// should stay visible rather than be silently clamped.
    pub fn advance_window(
        &mut self,
        user_id: &str,
        message_id: MessageId,
    ) -> Result<(), MemoryError> {
        let updated = self.db.execute(
            "UPDATE users SET window_start = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id, message_id.as_i64(), now_iso8601()],
        )?;
        if updated == 0 {
            return Err(MemoryError::user_not_found(user_id));
        }

        Ok(())
    }
}
