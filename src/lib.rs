pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use auth::Actor;
pub use crate::core::errors::LendingError;
pub use crate::core::services::{LendingService, NewApplication, NewUser};
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
