use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use lithub::auth::oauth::{IdentityProvider, ProviderProfile};
use lithub::auth::SessionToken;
use lithub::db::DatabaseClient;
use lithub::models::User;
use lithub::routes::create_routes;
use lithub::{AppConfig, AppError, AppState, Result};

/// Identity provider that accepts the code "good" for a fixed Google account
struct FakeGoogle;

#[async_trait]
impl IdentityProvider for FakeGoogle {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String> {
        Ok(format!("https://idp.test/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile> {
        if code != "good" {
            return Err(AppError::AuthError("There was an error logging in with Google".to_string()));
        }
        Ok(ProviderProfile {
            provider_account_id: "google-sub-1".to_string(),
            email: Some("grace@example.com".to_string()),
            name: Some("Grace Hopper".to_string()),
            image: Some("https://img.test/grace.png".to_string()),
            email_verified: true,
        })
    }
}

fn test_state() -> AppState {
    let config = AppConfig {
        jwt_secret: "integration-secret".to_string(),
        google_client_id: "client".to_string(),
        google_client_secret: "secret".to_string(),
        feed_page_size: 10,
        ..AppConfig::default()
    };
    AppState::from_parts(config, DatabaseClient::in_memory(), Arc::new(FakeGoogle))
}

fn app(state: &AppState) -> Router {
    create_routes().with_state(state.clone())
}

/// Create a user directly in the store and mint a bearer token for them
async fn signed_in_user(state: &AppState, email: &str) -> (Uuid, String) {
    let user = state
        .db
        .user_repo
        .create_user(&User::new(Some(email.to_string()), Some(email.to_string()), None))
        .await
        .unwrap();
    let token = state
        .auth_service
        .generate_token(&SessionToken {
            id: Some(user.id),
            name: user.name.clone(),
            email: user.email.clone(),
            ..SessionToken::default()
        })
        .unwrap();
    (user.id, token)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap()
}

#[tokio::test]
async fn test_google_sign_in_issues_enriched_session() {
    let state = test_state();

    let response = app(&state).oneshot(get("/api/auth/signin/google", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    let oauth_state = location.split("state=").nth(1).unwrap().to_string();
    let state_cookie = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("lithub.oauth-state="))
        .unwrap();

    let callback = Request::builder()
        .uri(format!("/api/auth/callback/google?code=good&state={}", oauth_state))
        .header(header::COOKIE, cookie_pair(&state_cookie))
        .body(Body::empty())
        .unwrap();
    let response = app(&state).oneshot(callback).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let session_cookie = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("lithub.session-token="))
        .unwrap();
    assert!(session_cookie.contains("HttpOnly"));

    let request = Request::builder()
        .uri("/api/auth/session")
        .header(header::COOKIE, cookie_pair(&session_cookie))
        .body(Body::empty())
        .unwrap();
    let session = body_json(app(&state).oneshot(request).await.unwrap()).await;

    let stored = state
        .db
        .user_repo
        .get_user_by_email("grace@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session["user"]["id"], json!(stored.id));
    assert_eq!(session["user"]["name"], "Grace Hopper");
    assert_eq!(session["user"]["image"], "https://img.test/grace.png");
    // Username was generated on first sign-in and persisted
    let username = session["user"]["username"].as_str().unwrap();
    assert_eq!(username.len(), 10);
    assert_eq!(stored.username.as_deref(), Some(username));

    let account = state.db.user_repo.get_account("google", "google-sub-1").await.unwrap();
    assert_eq!(account.map(|a| a.user_id), Some(stored.id));
}

#[tokio::test]
async fn test_callback_rejects_mismatched_state() {
    let state = test_state();
    let callback = Request::builder()
        .uri("/api/auth/callback/google?code=good&state=forged")
        .header(header::COOKIE, "lithub.oauth-state=expected")
        .body(Body::empty())
        .unwrap();
    let response = app(&state).oneshot(callback).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(state.db.user_repo.get_user_by_email("grace@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let state = test_state();
    let response = app(&state).oneshot(get("/api/auth/signin/github", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signed_out_session_is_empty_object() {
    let state = test_state();
    let response = app(&state).oneshot(get("/api/auth/session", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));

    let response = app(&state).oneshot(get("/api/auth/session", Some("not-a-jwt"))).await.unwrap();
    assert_eq!(body_json(response).await, json!({}));
}

#[tokio::test]
async fn test_comment_requires_session() {
    let state = test_state();
    let body = json!({ "postId": Uuid::new_v4(), "text": "hello" });
    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/subreddit/post/comment", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["status"], 401);
}

/// Community created by `token`'s user with one post in it
async fn community_with_post(state: &AppState, token: &str, name: &str) -> (String, String) {
    let response = app(state)
        .oneshot(json_request("POST", "/api/subreddit", Some(token), json!({ "name": name })))
        .await
        .unwrap();
    let subreddit_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/api/subreddit/post/create",
            Some(token),
            json!({ "title": format!("Welcome to {}", name), "subredditId": subreddit_id }),
        ))
        .await
        .unwrap();
    let post_id = body_json(response).await["id"].as_str().unwrap().to_string();
    (subreddit_id, post_id)
}

fn raw_request(method: &str, uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_malformed_comment_body_answers_422_json() {
    let state = test_state();
    let (_, token) = signed_in_user(&state, "typo@example.com").await;

    for body in ["{not json", r#"{"text":"hi"}"#, r#"{"postId":"not-a-uuid","text":"hi"}"#] {
        let response = app(&state)
            .oneshot(raw_request("PATCH", "/api/subreddit/post/comment", &token, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {}", body);
        let error = body_json(response).await;
        assert_eq!(error["status"], 422);
        assert!(error["error"].is_string());
    }

    // Rejections on other JSON endpoints take the same shape
    let response = app(&state)
        .oneshot(raw_request("PATCH", "/api/subreddit/post/vote", &token, r#"{"postId":1}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["status"], 422);
}

#[tokio::test]
async fn test_reply_to_comment_on_another_post_is_rejected() {
    let state = test_state();
    let (_, token) = signed_in_user(&state, "threads@example.com").await;
    let (_, first_post) = community_with_post(&state, &token, "first").await;
    let (_, second_post) = community_with_post(&state, &token, "second").await;

    let response = app(&state)
        .oneshot(json_request(
            "PATCH",
            "/api/subreddit/post/comment",
            Some(&token),
            json!({ "postId": first_post, "text": "root" }),
        ))
        .await
        .unwrap();
    let comment_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app(&state)
        .oneshot(json_request(
            "PATCH",
            "/api/subreddit/post/comment",
            Some(&token),
            json!({ "postId": second_post, "text": "misplaced", "replyToId": comment_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], 400);

    let response = app(&state)
        .oneshot(get(&format!("/api/posts/{}/comments", second_post), None))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsubscribe_without_subscription_is_bad_request() {
    let state = test_state();
    let (_, creator) = signed_in_user(&state, "owner@example.com").await;
    let (_, visitor) = signed_in_user(&state, "visitor@example.com").await;
    let (subreddit_id, _) = community_with_post(&state, &creator, "quiet").await;

    let response = app(&state)
        .oneshot(json_request(
            "POST",
            "/api/subreddit/unsubscribe",
            Some(&visitor),
            json!({ "subredditId": subreddit_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], 400);
}

#[tokio::test]
async fn test_community_post_comment_and_vote_flow() {
    let state = test_state();
    let (_, creator) = signed_in_user(&state, "creator@example.com").await;
    let (_, reader) = signed_in_user(&state, "reader@example.com").await;

    // Community
    let response = app(&state)
        .oneshot(json_request("POST", "/api/subreddit", Some(&creator), json!({ "name": "rustaceans" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let subreddit_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app(&state)
        .oneshot(json_request("POST", "/api/subreddit", Some(&reader), json!({ "name": "rustaceans" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Readers must subscribe before posting
    let post_body = json!({ "title": "Borrow checker tips", "content": { "blocks": [] }, "subredditId": subreddit_id });
    let response = app(&state)
        .oneshot(json_request("POST", "/api/subreddit/post/create", Some(&reader), post_body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&state)
        .oneshot(json_request("POST", "/api/subreddit/subscribe", Some(&reader), json!({ "subredditId": subreddit_id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state)
        .oneshot(json_request("POST", "/api/subreddit/post/create", Some(&reader), post_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let post_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Comment, then a reply
    let response = app(&state)
        .oneshot(json_request(
            "PATCH",
            "/api/subreddit/post/comment",
            Some(&creator),
            json!({ "postId": post_id, "text": "Welcome!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let comment_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app(&state)
        .oneshot(json_request(
            "PATCH",
            "/api/subreddit/post/comment",
            Some(&reader),
            json!({ "postId": post_id, "text": "Thanks", "replyToId": comment_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Voting the same way twice takes the vote back
    let vote = json!({ "postId": post_id, "voteType": "UP" });
    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/subreddit/post/vote", Some(&creator), vote.clone()))
        .await
        .unwrap();
    let first = body_json(response).await;
    assert_eq!(first["outcome"], "created");
    assert_eq!(first["votesAmt"], 1);

    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/subreddit/post/vote", Some(&creator), vote))
        .await
        .unwrap();
    let second = body_json(response).await;
    assert_eq!(second["outcome"], "removed");
    assert_eq!(second["votesAmt"], 0);

    let response = app(&state)
        .oneshot(json_request(
            "PATCH",
            "/api/subreddit/post/comment/vote",
            Some(&reader),
            json!({ "commentId": comment_id, "voteType": "DOWN" }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["votesAmt"], -1);

    // Threaded comments
    let response = app(&state)
        .oneshot(get(&format!("/api/posts/{}/comments", post_id), Some(&reader)))
        .await
        .unwrap();
    let thread = body_json(response).await;
    assert_eq!(thread.as_array().unwrap().len(), 1);
    assert_eq!(thread[0]["text"], "Welcome!");
    assert_eq!(thread[0]["currentVote"], "DOWN");
    assert_eq!(thread[0]["replies"][0]["text"], "Thanks");

    // Feed: followed communities for the reader, everything when signed out
    let response = app(&state).oneshot(get("/api/posts", Some(&reader))).await.unwrap();
    let feed = body_json(response).await;
    assert_eq!(feed[0]["title"], "Borrow checker tips");
    assert_eq!(feed[0]["subreddit"]["name"], "rustaceans");
    assert_eq!(feed[0]["comments"].as_array().unwrap().len(), 2);

    let response = app(&state)
        .oneshot(get("/api/posts?limit=5&page=1&subredditName=rustaceans", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // Community page
    let response = app(&state).oneshot(get("/api/r/rustaceans", Some(&reader))).await.unwrap();
    let page = body_json(response).await;
    assert_eq!(page["subreddit"]["subscriberCount"], 2);
    assert_eq!(page["subreddit"]["isSubscribed"], true);
    assert_eq!(page["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_username_update_and_conflict() {
    let state = test_state();
    let (_, first) = signed_in_user(&state, "first@example.com").await;
    let (_, second) = signed_in_user(&state, "second@example.com").await;

    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/username", Some(&first), json!({ "name": "ferris" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "ferris");

    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/username", Some(&second), json!({ "name": "ferris" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app(&state)
        .oneshot(json_request("PATCH", "/api/username", Some(&second), json!({ "name": "no spaces" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_layout_and_health() {
    let state = test_state();
    let response = app(&state).oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<title>Lithub</title>"));
    assert!(html.contains("A reddit clone built with Next.js and Typescript"));

    let response = app(&state).oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(body_json(response).await["status"], "healthy");

    // The stylesheet the layout links to is served
    assert!(html.contains(r#"href="/static/globals.css""#));
    let response = app(&state).oneshot(get("/static/globals.css", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
