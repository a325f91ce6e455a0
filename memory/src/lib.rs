//! Per-user conversation memory for a chat assistant.
//!
//! This crate persists every exchanged message, tracks a token budget bound
//! to each user's selected model, and exposes a bounded, ordered slice of
//! recent history ("the window") to feed each new model request.
//!
//! # Architecture
//!
//! ```text
//! Session (facade for the chat adapter)
//! └── MemoryStore (one SQLite connection)
//!     ├── settings: users table (model, temperature, window_start)
//!     ├── log: messages table (append-only, token_count at insert)
//!     ├── window: budget scan + one-way peg of window_start
//!     └── counter: TokenCounter (tiktoken cl100k_base)
//! ```
//!
//! History is never deleted. Trimming happens only by moving each user's
//! `window_start` pointer forward, either eagerly when a window overflows
//! the model budget or explicitly via reset.

mod db;
mod error;
mod log;
mod session;
mod settings;
mod store;
mod token_counter;
mod window;

pub use error::MemoryError;
pub use session::Session;
pub use store::{HistorySize, MemoryStore, StoredMessage, UserProfile};
pub use token_counter::TokenCounter;
pub use window::Window;
