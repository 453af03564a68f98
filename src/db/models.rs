use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user record as stored. The password hash never leaves the store
/// layer; everything outward-facing uses `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Outward-facing identity: what goes into token claims and post author
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: u64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub author: PublicUser,
    pub created_at: i64,
}

/// Caller-supplied fields for a new post. The author is deliberately not
/// part of this shape; it always comes from the verified token.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPost {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}
