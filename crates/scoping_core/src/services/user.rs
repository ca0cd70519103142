//! crates/scoping_core/src/services/user.rs

use std::sync::Arc;

use tracing::{debug, info};

use super::{log_failure, new_id, require_id};
use crate::domain::{Page, User};
use crate::ports::{PortResult, UserRepository};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Creates a user under a freshly generated id, ignoring any id supplied.
    pub async fn create_user(&self, mut user: User) -> PortResult<User> {
        user.id = new_id();
        user.validate()?;
        debug!("Creating user {} . . .", user.id);

        let created = self
            .users
            .create_user(user)
            .await
            .map_err(log_failure("create user", "<new>"))?;
        info!("Created user {}.", created.id);
        Ok(created)
    }

    pub async fn get_user(&self, id: &str) -> PortResult<User> {
        self.users
            .get_user(id)
            .await
            .map_err(log_failure("get user", id))
    }

    pub async fn list_users(&self, page: Page) -> PortResult<Vec<User>> {
        self.users
            .list_users(page)
            .await
            .map_err(log_failure("list users", "*"))
    }

    /// Merges the supplied fields into the user stored under `id`.
    pub async fn update_user(&self, id: &str, mut user: User) -> PortResult<User> {
        require_id(id, "user")?;
        user.id = id.to_string();
        user.validate()?;

        self.users
            .update_user(user)
            .await
            .map_err(log_failure("update user", id))
    }

    pub async fn delete_user(&self, id: &str) -> PortResult<()> {
        self.users
            .delete_user(id)
            .await
            .map_err(log_failure("delete user", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryDocumentStore;
    use crate::ports::PortError;
    use crate::repositories::DocumentUserRepository;
    use pretty_assertions::assert_eq;

    fn service() -> UserService {
        UserService::new(Arc::new(DocumentUserRepository::new(Arc::new(
            InMemoryDocumentStore::new(),
        ))))
    }

    fn ann() -> User {
        User {
            id: "client-chosen".to_string(),
            name: Some("Ann".to_string()),
            email_address: Some("ann@x.com".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_a_fresh_id() {
        let service = service();
        let first = service.create_user(ann()).await.unwrap();
        let second = service.create_user(ann()).await.unwrap();

        assert_ne!(first.id, "client-chosen");
        assert_ne!(first.id, second.id);
        assert_eq!(service.get_user(&first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn create_rejects_missing_email() {
        let result = service()
            .create_user(User {
                email_address: None,
                ..ann()
            })
            .await;
        assert!(matches!(result, Err(PortError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let service = service();
        let created = service.create_user(ann()).await.unwrap();

        service.delete_user(&created.id).await.unwrap();
        service.delete_user(&created.id).await.unwrap();
        assert!(matches!(
            service.get_user(&created.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_uses_the_path_id() {
        let service = service();
        let created = service.create_user(ann()).await.unwrap();

        let updated = service
            .update_user(
                &created.id,
                User {
                    id: "ignored".to_string(),
                    corporate: true,
                    company: Some("Acme".to_string()),
                    ..ann()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.company.as_deref(), Some("Acme"));
    }
}
