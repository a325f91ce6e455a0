//! Core domain types for chatmem.
//!
//! This crate contains pure domain types with no IO and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod ids;
mod model;
mod role;
mod temperature;

pub use ids::MessageId;
pub use model::{ChatModel, SUPPORTED_MODEL_NAMES, UnknownModelError};
pub use role::{Role, UnknownRoleError};
pub use temperature::{Temperature, TemperatureRangeError};
