//! The session facade: the single entry point for external collaborators.
//!
//! The chat-platform adapter calls these methods and maps the typed errors
//! to user-facing text. The facade holds no state of its own beyond the
//! configured default model; everything else lives in the store.

use std::path::Path;

use chatmem_types::{ChatModel, MessageId, Role, Temperature};

use crate::error::MemoryError;
use crate::store::{HistorySize, MemoryStore, StoredMessage, UserProfile};
use crate::window::Window;

pub struct Session {
    store: MemoryStore,
    default_model: ChatModel,
}

impl Session {
    /// Open a session over the on-disk history database.
    pub fn open(path: impl AsRef<Path>, default_model: ChatModel) -> Result<Self, MemoryError> {
        Ok(Self {
            store: MemoryStore::open(path)?,
            default_model,
        })
    }

    /// Session over an in-memory store (for testing).
    pub fn open_in_memory(default_model: ChatModel) -> Result<Self, MemoryError> {
        Ok(Self {
            store: MemoryStore::open_in_memory()?,
            default_model,
        })
    }

    /// Explicitly initialize a user (idempotent).
    pub fn ensure_user(&mut self, user_id: &str) -> Result<UserProfile, MemoryError> {
        self.store.ensure_user(user_id, self.default_model)
    }

    /// Persist one turn. Creates the user lazily on first contact.
    pub fn save_message(
        &mut self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, MemoryError> {
        self.store.ensure_user(user_id, self.default_model)?;
        self.store.append(user_id, role, content)
    }

    /// The chronological, budget-truncated message sequence to send to the
    /// model. May advance the user's window-start pointer as a side effect.
    pub fn window(&mut self, user_id: &str) -> Result<Window, MemoryError> {
        self.store.build_window(user_id)
    }

    /// Rows and raw token total currently behind the window pointer,
    /// untruncated by any budget.
    pub fn window_size(&self, user_id: &str) -> Result<HistorySize, MemoryError> {
        let window_start = self.store.window_start(user_id)?;
        self.store.count_since(user_id, window_start)
    }

    pub fn model(&self, user_id: &str) -> Result<ChatModel, MemoryError> {
        self.store.user_model(user_id)
    }

    /// Select a model by name. Unknown names are rejected before anything is
    /// persisted.
    pub fn set_model(&mut self, user_id: &str, name: &str) -> Result<ChatModel, MemoryError> {
        let model = ChatModel::parse(name)?;
        self.store.set_model(user_id, model)?;
        Ok(model)
    }

    pub fn temperature(&self, user_id: &str) -> Result<Temperature, MemoryError> {
        self.store.user_temperature(user_id)
    }

    /// Set the sampling temperature. Values outside `[0.0, 1.0]` are rejected
    /// before anything is persisted.
    pub fn set_temperature(
        &mut self,
        user_id: &str,
        value: f64,
    ) -> Result<Temperature, MemoryError> {
        let temperature = Temperature::new(value)?;
        self.store.set_temperature(user_id, temperature)?;
        Ok(temperature)
    }

    /// Drop all prior context from future windows without deleting rows.
    pub fn reset(&mut self, user_id: &str) -> Result<(), MemoryError> {
        self.store.reset(user_id)
    }

    /// Logically delete a single message from windows and counts.
    pub fn archive_message(&mut self, message_id: MessageId) -> Result<bool, MemoryError> {
        self.store.deactivate(message_id)
    }
}
