use std::collections::HashMap;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::models::User;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Bad request")]
    EmptyCredentials,
    #[error("duplicated username")]
    DuplicateUsername,
    // Unknown username and wrong password share this variant so callers
    // cannot probe which usernames exist.
    #[error("bad username or password")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("password hashing failure")]
    Hash,
}

/// Credential store: the sole writer of the user table. Backings are
/// interchangeable behind this trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a new user, hashing the password at rest. Fails on empty
    /// username or password, and if the username is already taken (exact,
    /// case-sensitive match).
    async fn create(&self, username: &str, password: &str) -> Result<User, UserStoreError>;

    /// Checks credentials against the stored hash.
    async fn authorize(&self, username: &str, password: &str) -> Result<User, UserStoreError>;
}

// The stores enforce this themselves so no caller can persist a user with
// an empty username or password.
fn check_credentials(username: &str, password: &str) -> Result<(), UserStoreError> {
    if username.is_empty() || password.is_empty() {
        return Err(UserStoreError::EmptyCredentials);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, UserStoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| UserStoreError::Hash)
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, UserStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, username: &str, password: &str) -> Result<User, UserStoreError> {
        check_credentials(username, password)?;
        let password_hash = hash_password(password)?;

        // Concurrent registrations of the same username are settled by the
        // UNIQUE constraint; the loser maps to DuplicateUsername.
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                password_hash,
            }),
            Err(e) if is_unique_violation(&e) => Err(UserStoreError::DuplicateUsername),
            Err(e) => Err(e.into()),
        }
    }

    async fn authorize(&self, username: &str, password: &str) -> Result<User, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserStoreError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(UserStoreError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// In-memory backing, used by tests and available as a drop-in replacement
/// for the sqlite store.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<InMemoryUsers>,
}

#[derive(Default)]
struct InMemoryUsers {
    next_id: i64,
    by_username: HashMap<String, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, username: &str, password: &str) -> Result<User, UserStoreError> {
        check_credentials(username, password)?;
        let password_hash = hash_password(password)?;

        let mut inner = self.inner.lock().await;
        if inner.by_username.contains_key(username) {
            return Err(UserStoreError::DuplicateUsername);
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: username.to_string(),
            password_hash,
        };
        inner.by_username.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn authorize(&self, username: &str, password: &str) -> Result<User, UserStoreError> {
        let user = self
            .inner
            .lock()
            .await
            .by_username
            .get(username)
            .cloned()
            .ok_or(UserStoreError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(UserStoreError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_authorize() {
        let store = InMemoryUserStore::new();

        let created = store.create("alice", "pw1").await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.username, "alice");
        // Hashed at rest, never the plaintext.
        assert_ne!(created.password_hash, "pw1");

        let authorized = store.authorize("alice", "pw1").await.unwrap();
        assert_eq!(authorized.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = InMemoryUserStore::new();

        store.create("alice", "pw1").await.unwrap();
        let second = store.create("alice", "pw2").await;
        assert!(matches!(second, Err(UserStoreError::DuplicateUsername)));

        // The first registration still wins.
        assert!(store.authorize("alice", "pw1").await.is_ok());
        assert!(store.authorize("alice", "pw2").await.is_err());
    }

    #[tokio::test]
    async fn test_bad_password_and_unknown_user_are_indistinguishable() {
        let store = InMemoryUserStore::new();
        store.create("alice", "pw1").await.unwrap();

        let wrong_password = store.authorize("alice", "nope").await.unwrap_err();
        let unknown_user = store.authorize("nobody", "anything").await.unwrap_err();

        assert!(matches!(wrong_password, UserStoreError::InvalidCredentials));
        assert!(matches!(unknown_user, UserStoreError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_by_the_store() {
        let store = InMemoryUserStore::new();

        assert!(matches!(
            store.create("", "pw").await,
            Err(UserStoreError::EmptyCredentials)
        ));
        assert!(matches!(
            store.create("alice", "").await,
            Err(UserStoreError::EmptyCredentials)
        ));

        // Nothing was persisted by the rejected calls.
        assert!(store.authorize("", "pw").await.is_err());
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.create("alice", "pw1").await.unwrap();

        assert!(store.create("Alice", "pw2").await.is_ok());
        assert!(matches!(
            store.authorize("ALICE", "pw1").await,
            Err(UserStoreError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        // A single connection so the in-memory database is actually shared.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteUserStore::new(pool).await.unwrap();

        let created = store.create("alice", "pw1").await.unwrap();
        assert_eq!(created.id, 1);

        let duplicate = store.create("alice", "pw2").await;
        assert!(matches!(duplicate, Err(UserStoreError::DuplicateUsername)));

        assert!(matches!(
            store.create("", "pw").await,
            Err(UserStoreError::EmptyCredentials)
        ));

        assert!(store.authorize("alice", "pw1").await.is_ok());
        assert!(matches!(
            store.authorize("alice", "wrong").await,
            Err(UserStoreError::InvalidCredentials)
        ));
    }
}
