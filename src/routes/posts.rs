use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use uuid::Uuid;
use crate::auth::{AuthSession, MaybeSession};
use crate::routes::extract::ApiJson;
use crate::models::post::{CreatePostRequest, ExtendedPost, FeedQuery};
use crate::models::Post;
use crate::{AppState, Result};

/// GET /api/posts?limit&page&subredditName
pub async fn get_posts(
    State(app_state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<FeedQuery>,
) -> Result<ResponseJson<Vec<ExtendedPost>>> {
    let viewer = session.map(|s| s.user.id);
    let posts = app_state.post_service.get_posts(query, viewer).await?;
    Ok(ResponseJson(posts))
}

/// GET /api/posts/{post_id}
pub async fn get_post(
    State(app_state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(post_id): Path<Uuid>,
) -> Result<ResponseJson<ExtendedPost>> {
    let viewer = session.map(|s| s.user.id);
    let post = app_state.post_service.get_post(post_id, viewer).await?;
    Ok(ResponseJson(post))
}

/// POST /api/subreddit/post/create
pub async fn create_post(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, ResponseJson<Post>)> {
    let post = app_state.post_service.create_post(session.user.id, request).await?;
    Ok((StatusCode::CREATED, ResponseJson(post)))
}
