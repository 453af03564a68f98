use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use tracing::warn;

use crate::api::auth::{AuthUser, require_json};
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::db::models::{NewPost, Post};

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Result<Json<Post>, ApiError> {
    let payload = require_json(payload)?;
    if payload.category.is_empty() || payload.kind.is_empty() || payload.title.is_empty() {
        return Err(ApiError::Validation("Bad request".to_string()));
    }

    let post = state.posts.create(payload, identity).await;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.posts.delete(post_id, &identity).await {
        warn!(post_id, username = %identity.username, error = %e, "post delete rejected");
        return Err(e.into());
    }
    Ok(Json(json!({ "message": "success" })))
}

pub async fn get_all_posts(State(state): State<Arc<AppState>>) -> Json<Vec<Post>> {
    Json(state.posts.get_all().await)
}

pub async fn get_posts_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Vec<Post>> {
    Json(state.posts.get_by_category(&category).await)
}

pub async fn get_posts_by_user(
    State(state): State<Arc<AppState>>,
    Path(login): Path<String>,
) -> Json<Vec<Post>> {
    Json(state.posts.get_by_author(&login).await)
}

pub async fn get_post_by_id(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<u64>,
) -> Result<Json<Post>, ApiError> {
    state
        .posts
        .get_by_id(post_id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}
