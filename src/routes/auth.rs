use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::{clear_cookie, cookie_value, set_cookie, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use crate::auth::oauth::{generate_state, IdentityProvider};
use crate::auth::session::{enrich_token, redirect_target};
use crate::auth::{MaybeSession, SessionToken};
use crate::{AppError, AppState, Result};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn provider_for<'a>(app_state: &'a AppState, provider: &str) -> Result<&'a dyn IdentityProvider> {
    let identity_provider = app_state.identity_provider.as_ref();
    if identity_provider.id() == provider {
        Ok(identity_provider)
    } else {
        Err(AppError::NotFound(format!("Unknown sign-in provider: {}", provider)))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::InternalError(format!("Invalid header value: {}", e)))
}

/// GET /api/auth/signin/{provider}
pub async fn sign_in(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Response> {
    let identity_provider = provider_for(&app_state, &provider)?;
    let state = generate_state();
    let location = identity_provider.authorize_url(&state)?;

    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, header_value(&location)?);
    response.headers_mut().insert(
        header::SET_COOKIE,
        header_value(&set_cookie(OAUTH_STATE_COOKIE, &state, Duration::minutes(10)))?,
    );
    Ok(response)
}

/// GET /api/auth/callback/{provider}
///
/// Finishes the provider round trip: links or creates the local user, issues
/// an enriched session token as a cookie and sends the browser home.
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let identity_provider = provider_for(&app_state, &provider)?;

    if let Some(error) = params.error {
        tracing::warn!("⚠️ OAUTH: {} returned error: {}", provider, error);
        return Err(AppError::AuthError(format!("There was an error logging in with {}", provider)));
    }

    let expected_state = cookie_value(&headers, OAUTH_STATE_COOKIE)
        .ok_or_else(|| AppError::AuthError("Missing sign-in state".to_string()))?;
    if params.state.as_deref() != Some(expected_state) {
        return Err(AppError::AuthError("Sign-in state mismatch".to_string()));
    }
    let code = params
        .code
        .ok_or_else(|| AppError::ValidationError("Missing authorization code".to_string()))?;

    let profile = identity_provider.exchange_code(&code).await?;
    let user = app_state
        .user_service
        .find_or_create_oauth_user(identity_provider.id(), &profile)
        .await?;

    let initial = SessionToken {
        id: None,
        name: profile.name,
        email: profile.email,
        picture: profile.image,
        username: None,
    };
    let token = enrich_token(app_state.db.user_repo.as_ref(), initial, Some(&user)).await;
    let jwt = app_state.auth_service.generate_token(&token)?;

    tracing::info!("🔐 AUTH: {} signed in with {}", user.id, provider);

    let mut response = StatusCode::FOUND.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(header::LOCATION, HeaderValue::from_static(redirect_target()));
    response_headers.append(
        header::SET_COOKIE,
        header_value(&set_cookie(SESSION_COOKIE, &jwt, app_state.auth_service.max_age()))?,
    );
    response_headers.append(header::SET_COOKIE, header_value(&clear_cookie(OAUTH_STATE_COOKIE))?);
    Ok(response)
}

/// POST /api/auth/signout
pub async fn sign_out() -> Result<Response> {
    let mut response = Json(json!({ "url": redirect_target() })).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, header_value(&clear_cookie(SESSION_COOKIE))?);
    Ok(response)
}

/// GET /api/auth/session, `{}` when signed out
pub async fn session(MaybeSession(session): MaybeSession) -> Result<Json<Value>> {
    match session {
        Some(session) => Ok(Json(serde_json::to_value(session).map_err(|e| {
            AppError::InternalError(format!("Failed to serialize session: {}", e))
        })?)),
        None => Ok(Json(json!({}))),
    }
}
