//! In-memory user repository - stands in for the relational store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use learnshare_core::domain::User;
use learnshare_core::error::RepoError;
use learnshare_core::ports::{BaseRepository, UserRepository};

/// Users kept in a HashMap. Email uniqueness is enforced on save.
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(RepoError::Constraint(format!(
                "email {} already in use",
                user.email
            )));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new("learner".into(), email.into(), "hash".into())
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemoryUserRepository::new();
        let saved = repo.save(user("a@example.com")).await.unwrap();

        assert_eq!(repo.find_by_id(saved.id).await.unwrap(), Some(saved.clone()));
        assert_eq!(
            repo.find_by_email("A@Example.com").await.unwrap(),
            Some(saved)
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.save(user("a@example.com")).await.unwrap();

        let err = repo.save(user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_email() {
        let repo = InMemoryUserRepository::new();
        let mut saved = repo.save(user("a@example.com")).await.unwrap();

        saved.activate();
        repo.save(saved.clone()).await.unwrap();
        assert_eq!(repo.find_by_id(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = InMemoryUserRepository::new();
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }
}
