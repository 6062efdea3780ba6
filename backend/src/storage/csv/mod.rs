//! # CSV Storage Module
//!
//! File-based storage for the game data: one YAML file for the user and one
//! CSV table per entity type, all in a single data directory.
//!
//! ## Features
//!
//! - Full CRUD per entity through the storage traits
//! - Atomic file writes with temp files
//! - Journaled multi-file commits with roll-forward on open

pub mod connection;
pub mod life_area_repository;
pub mod quest_repository;
pub mod reward_repository;
pub mod subtask_repository;
pub mod user_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use life_area_repository::LifeAreaRepository;
pub use quest_repository::QuestRepository;
pub use reward_repository::RewardRepository;
pub use subtask_repository::SubtaskRepository;
pub use user_repository::UserRepository;
