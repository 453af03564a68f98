use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::models::{NewPost, Post, PublicUser};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostStoreError {
    #[error("post not found")]
    NotFound,
    #[error("not the author")]
    NotAuthor,
}

/// Post store. Reads are open to everyone; deletion is restricted to the
/// post's author.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Stores a new post. The author is always the authenticated identity,
    /// ids are sequential starting at 1.
    async fn create(&self, new_post: NewPost, author: PublicUser) -> Post;

    /// Removes a post if the requester is its author.
    async fn delete(&self, post_id: u64, requester: &PublicUser) -> Result<(), PostStoreError>;

    async fn get_by_id(&self, post_id: u64) -> Option<Post>;
    async fn get_by_category(&self, category: &str) -> Vec<Post>;
    async fn get_by_author(&self, username: &str) -> Vec<Post>;
    async fn get_all(&self) -> Vec<Post>;
}

#[derive(Default)]
pub struct InMemoryPostStore {
    // One lock over the id counter and the list: concurrent creates get
    // distinct ids, concurrent deletes of the same id succeed at most once.
    inner: Mutex<PostsInner>,
}

#[derive(Default)]
struct PostsInner {
    next_id: u64,
    posts: Vec<Post>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, new_post: NewPost, author: PublicUser) -> Post {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let post = Post {
            id: inner.next_id,
            category: new_post.category,
            kind: new_post.kind,
            title: new_post.title,
            author,
            created_at: now_unix(),
        };
        inner.posts.push(post.clone());
        post
    }

    async fn delete(&self, post_id: u64, requester: &PublicUser) -> Result<(), PostStoreError> {
        let mut inner = self.inner.lock().await;
        let position = inner
            .posts
            .iter()
            .position(|post| post.id == post_id)
            .ok_or(PostStoreError::NotFound)?;

        if inner.posts[position].author.id != requester.id {
            return Err(PostStoreError::NotAuthor);
        }

        inner.posts.remove(position);
        Ok(())
    }

    async fn get_by_id(&self, post_id: u64) -> Option<Post> {
        let inner = self.inner.lock().await;
        inner.posts.iter().find(|post| post.id == post_id).cloned()
    }

    async fn get_by_category(&self, category: &str) -> Vec<Post> {
        let inner = self.inner.lock().await;
        inner
            .posts
            .iter()
            .filter(|post| post.category == category)
            .cloned()
            .collect()
    }

    async fn get_by_author(&self, username: &str) -> Vec<Post> {
        let inner = self.inner.lock().await;
        inner
            .posts
            .iter()
            .filter(|post| post.author.username == username)
            .cloned()
            .collect()
    }

    async fn get_all(&self) -> Vec<Post> {
        let inner = self.inner.lock().await;
        inner.posts.clone()
    }
}
