use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Persistence seam for user records. Lookups take the already-normalized
/// (lowercased) email; uniqueness is enforced here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> anyhow::Result<User>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, full_name, email, password_hash, verified, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, verified, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

/// In-memory store backing `AppState::fake()`.
#[derive(Default)]
pub struct MemUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn insert(&self, user: User) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        anyhow::ensure!(
            !users.iter().any(|u| u.email == user.email),
            "email already exists: {}",
            user.email
        );
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mem_store_roundtrips_by_email_and_id() {
        let store = MemUserStore::default();
        let user = store
            .insert(User::new("A B", "ab@case.edu", "hash"))
            .await
            .expect("insert");

        let by_email = store.find_by_email("ab@case.edu").await.expect("lookup");
        assert_eq!(by_email.as_ref().map(|u| u.id), Some(user.id));

        let by_id = store.find_by_id(user.id).await.expect("lookup");
        assert_eq!(by_id.map(|u| u.email), Some("ab@case.edu".to_string()));
    }

    #[tokio::test]
    async fn mem_store_rejects_duplicate_email() {
        let store = MemUserStore::default();
        store
            .insert(User::new("A B", "dup@case.edu", "hash"))
            .await
            .expect("first insert");
        let err = store
            .insert(User::new("C D", "dup@case.edu", "hash"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
