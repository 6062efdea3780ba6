//! # User Repository
//!
//! The single user record lives in `user.yaml` at the root of the data
//! directory, the same way per-entity config files are kept as YAML next to
//! the CSV tables.

use anyhow::Result;
use async_trait::async_trait;
use shared::User;
use tracing::debug;

use super::connection::CsvConnection;
use crate::storage::traits::{ChangeSet, Connection, UserStorage};

#[derive(Clone)]
pub struct UserRepository {
    connection: CsvConnection,
}

impl UserRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn get_user(&self) -> Result<Option<User>> {
        self.connection.read_user()
    }

    async fn store_user(&self, user: &User) -> Result<()> {
        debug!("Storing user {}", user.id);
        self.connection
            .commit(ChangeSet::new().with_user(user.clone()))
            .await
    }
}
