//! crates/scoping_core/src/repositories/message.rs

use std::sync::Arc;

use async_trait::async_trait;

use super::{from_document, to_document, MESSAGES_COLLECTION, USERS_COLLECTION};
use crate::domain::{timestamp, Message, Page};
use crate::ports::{Document, DocumentStore, ListQuery, MessageRepository, PortError, PortResult};

/// Stores messages in a sub-collection of their owner's user document
/// (`users/{user_id}/messages/{message_id}`). Timestamps are assigned here.
#[derive(Clone)]
pub struct DocumentMessageRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentMessageRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(user_id: &str) -> String {
        format!("{USERS_COLLECTION}/{user_id}/{MESSAGES_COLLECTION}")
    }

    fn owner(message: &Message) -> PortResult<&str> {
        message
            .user_id
            .as_deref()
            .ok_or_else(|| PortError::InvalidInput("message requires a user_id".to_string()))
    }
}

fn with_keys(user_id: &str, id: String, document: Document) -> PortResult<Message> {
    let mut message: Message = from_document(document)?;
    message.id = id;
    message.user_id = Some(user_id.to_string());
    Ok(message)
}

#[async_trait]
impl MessageRepository for DocumentMessageRepository {
    async fn get_message(&self, user_id: &str, message_id: &str) -> PortResult<Message> {
        let document = self.store.get(&Self::collection(user_id), message_id).await?;
        with_keys(user_id, message_id.to_string(), document)
    }

    async fn list_messages(&self, user_id: &str, page: Page) -> PortResult<Vec<Message>> {
        let query = ListQuery::ordered_by("created_at", page);
        self.store
            .list(&Self::collection(user_id), &query)
            .await?
            .into_iter()
            .map(|(id, document)| with_keys(user_id, id, document))
            .collect()
    }

    async fn create_message(&self, mut message: Message) -> PortResult<Message> {
        let user_id = Self::owner(&message)?.to_string();
        message.created_at = Some(timestamp::now());
        message.updated_at = None;

        self.store
            .set(&Self::collection(&user_id), &message.id, to_document(&message)?)
            .await?;
        Ok(message)
    }

    async fn update_message(&self, mut message: Message) -> PortResult<Message> {
        let user_id = Self::owner(&message)?.to_string();
        message.created_at = None;
        message.updated_at = Some(timestamp::now());

        let merged = self
            .store
            .merge(&Self::collection(&user_id), &message.id, to_document(&message)?)
            .await?;
        with_keys(&user_id, message.id, merged)
    }

    async fn delete_message(&self, user_id: &str, message_id: &str) -> PortResult<()> {
        self.store.delete(&Self::collection(user_id), message_id).await
    }
}
