use thiserror::Error;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    error::StoreError,
};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no user with id {0}")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load the user a verified token speaks for. Non-positive ids never match.
pub async fn resolve_identity(users: &dyn UserStore, subject: i64) -> Result<User, ResolveError> {
    if subject <= 0 {
        return Err(ResolveError::NotFound(subject));
    }
    users
        .find_by_id(subject)
        .await?
        .ok_or(ResolveError::NotFound(subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::NewUser, memory::MemoryStore};

    #[tokio::test]
    async fn resolves_existing_user() {
        let store = MemoryStore::new();
        let user = store
            .insert(NewUser {
                first_name: "A".into(),
                last_name: "B".into(),
                email: "a@b.com".into(),
                password_hash: "h".into(),
            })
            .await
            .unwrap();
        let found = resolve_identity(&store, user.id).await.unwrap();
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn unknown_and_zero_ids_are_not_found() {
        let store = MemoryStore::new();
        for id in [0, -1, 99] {
            let err = resolve_identity(&store, id).await.unwrap_err();
            assert!(matches!(err, ResolveError::NotFound(i) if i == id));
        }
    }
}
