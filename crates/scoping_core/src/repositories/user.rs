//! crates/scoping_core/src/repositories/user.rs
//!
//! Users as documents of the `users` collection.

use std::sync::Arc;

use async_trait::async_trait;

use super::{from_document, to_document, USERS_COLLECTION};
use crate::domain::{Page, User};
use crate::ports::{DocumentStore, ListQuery, PortResult, UserRepository};

/// Stores users as documents in the `users` collection, keyed by user id.
#[derive(Clone)]
pub struct DocumentUserRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentUserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    async fn get_user(&self, id: &str) -> PortResult<User> {
        let document = self.store.get(USERS_COLLECTION, id).await?;
        let mut user: User = from_document(document)?;
        user.id = id.to_string();
        Ok(user)
    }

    async fn list_users(&self, page: Page) -> PortResult<Vec<User>> {
        let query = ListQuery::ordered_by("email_address", page);
        self.store
            .list(USERS_COLLECTION, &query)
            .await?
            .into_iter()
            .map(|(id, document)| {
                let mut user: User = from_document(document)?;
                user.id = id;
                Ok(user)
            })
            .collect()
    }

    async fn create_user(&self, user: User) -> PortResult<User> {
        self.store
            .set(USERS_COLLECTION, &user.id, to_document(&user)?)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, user: User) -> PortResult<User> {
        let merged = self
            .store
            .merge(USERS_COLLECTION, &user.id, to_document(&user)?)
            .await?;
        let mut updated: User = from_document(merged)?;
        updated.id = user.id;
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> PortResult<()> {
        self.store.delete(USERS_COLLECTION, id).await
    }
}
