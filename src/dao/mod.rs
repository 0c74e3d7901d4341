/// Storage backends for games, questions, players and answers.
pub mod game_store;
/// Database model definitions.
pub mod models;
/// Typed access layer publishing change notifications.
pub mod repository;
/// Storage abstraction layer for database operations.
pub mod storage;
