use axum::{
    extract::State,
    response::Json as ResponseJson,
};

use crate::auth::AuthSession;
use crate::routes::extract::ApiJson;
use crate::models::user::{UserResponse, UsernameRequest};
use crate::{AppState, Result};

/// PATCH /api/username
pub async fn update_username(
    State(app_state): State<AppState>,
    AuthSession(session): AuthSession,
    ApiJson(request): ApiJson<UsernameRequest>,
) -> Result<ResponseJson<UserResponse>> {
    let user = app_state.user_service.update_username(session.user.id, &request.name).await?;
    Ok(ResponseJson(user.into()))
}
