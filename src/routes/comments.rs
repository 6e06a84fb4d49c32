use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthSession, MaybeSession};
use crate::routes::extract::ApiJson;
use crate::models::comment::{CommentRequest, CommentResponse};
use crate::models::Comment;
use crate::{AppState, Result};

/// Threaded comments for a post, with each comment's score for the viewer
///
/// GET /api/posts/{post_id}/comments
pub async fn get_post_comments(
    Path(post_id): Path<Uuid>,
    State(app_state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<Vec<CommentResponse>>> {
    let viewer = session.map(|s| s.user.id);
    let comments = app_state.comment_service.get_comments_for_post(post_id, viewer).await?;
    tracing::debug!("✅ Retrieved {} top-level comments for post {}", comments.len(), post_id);
    Ok(Json(comments))
}

/// Comment on a post or reply to a comment
///
/// PATCH /api/subreddit/post/comment
/// Body: { "postId", "text", "replyToId"? }
pub async fn create_comment(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<Json<Comment>> {
    let comment = app_state.comment_service.create_comment(session.user.id, request).await?;
    Ok(Json(comment))
}
