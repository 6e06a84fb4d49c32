use axum::{
    extract::State,
    response::Json as ResponseJson,
};

use crate::auth::AuthSession;
use crate::routes::extract::ApiJson;
use crate::models::vote::{CommentVoteRequest, PostVoteRequest, VoteResponse};
use crate::{AppState, Result};

/// PATCH /api/subreddit/post/vote
pub async fn vote_post(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<PostVoteRequest>,
) -> Result<ResponseJson<VoteResponse>> {
    let response = app_state.vote_service.vote_post(session.user.id, request).await?;
    Ok(ResponseJson(response))
}

/// PATCH /api/subreddit/post/comment/vote
pub async fn vote_comment(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<CommentVoteRequest>,
) -> Result<ResponseJson<VoteResponse>> {
    let response = app_state.vote_service.vote_comment(session.user.id, request).await?;
    Ok(ResponseJson(response))
}
