//! Storage module for database and configuration.

pub mod account_store;
pub mod config;
pub mod database;
pub mod retry;
pub mod schema;
pub mod social_store;

pub use account_store::AccountStore;
pub use config::{AppConfig, ConfigError, ProgressionRules, StorageSettings};
pub use database::{Database, DatabaseError};
pub use retry::{with_retry, RetryPolicy};
pub use social_store::{FriendshipStatus, SocialStore};
