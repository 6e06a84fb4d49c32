use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::{AuthSession, MaybeSession};
use crate::routes::extract::ApiJson;
use crate::models::post::{ExtendedPost, FeedQuery};
use crate::models::subreddit::{CreateSubredditRequest, SubredditResponse, SubscriptionRequest};
use crate::models::Subreddit;
use crate::{AppState, Result};

/// POST /api/subreddit
pub async fn create_subreddit(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<CreateSubredditRequest>,
) -> Result<(StatusCode, ResponseJson<Subreddit>)> {
    let subreddit = app_state.subreddit_service.create_subreddit(session.user.id, request).await?;
    Ok((StatusCode::CREATED, ResponseJson(subreddit)))
}

/// POST /api/subreddit/subscribe
pub async fn subscribe(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<SubscriptionRequest>,
) -> Result<ResponseJson<Value>> {
    let subreddit = app_state.subreddit_service.subscribe(session.user.id, request.subreddit_id).await?;
    Ok(ResponseJson(json!({ "subredditId": subreddit.id, "name": subreddit.name })))
}

/// POST /api/subreddit/unsubscribe
pub async fn unsubscribe(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<SubscriptionRequest>,
) -> Result<ResponseJson<Value>> {
    let subreddit = app_state.subreddit_service.unsubscribe(session.user.id, request.subreddit_id).await?;
    Ok(ResponseJson(json!({ "subredditId": subreddit.id, "name": subreddit.name })))
}

#[derive(Debug, Serialize)]
pub struct CommunityPage {
    pub subreddit: SubredditResponse,
    pub posts: Vec<ExtendedPost>,
}

/// Community page: details plus one page of its posts
///
/// GET /api/r/{name}?limit&page
pub async fn get_subreddit(
    State(app_state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(name): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<ResponseJson<CommunityPage>> {
    let viewer = session.map(|s| s.user.id);
    let subreddit = app_state.subreddit_service.get_subreddit(&name, viewer).await?;
    let query = FeedQuery { subreddit_name: Some(subreddit.name.clone()), ..query };
    let posts = app_state.post_service.get_posts(query, viewer).await?;
    Ok(ResponseJson(CommunityPage { subreddit, posts }))
}
