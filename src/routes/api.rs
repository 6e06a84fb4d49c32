use axum::{routing::{get, patch, post}, Router, Json};
use serde_json::{json, Value};
use crate::AppState;
use crate::routes::{auth, comments, posts, subreddits, users, vote_routes};

pub fn routes() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(api_health))
        .route("/auth/signin/:provider", get(auth::sign_in))
        .route("/auth/callback/:provider", get(auth::callback))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/session", get(auth::session))
        .route("/posts", get(posts::get_posts))
        .route("/posts/:post_id", get(posts::get_post))
        .route("/posts/:post_id/comments", get(comments::get_post_comments))
        .route("/r/:name", get(subreddits::get_subreddit));

    // Handlers below take an `AuthSession` and answer 401 without one
    let protected_routes = Router::new()
        .route("/subreddit", post(subreddits::create_subreddit))
        .route("/subreddit/subscribe", post(subreddits::subscribe))
        .route("/subreddit/unsubscribe", post(subreddits::unsubscribe))
        .route("/subreddit/post/create", post(posts::create_post))
        .route("/subreddit/post/vote", patch(vote_routes::vote_post))
        .route("/subreddit/post/comment", patch(comments::create_comment))
        .route("/subreddit/post/comment/vote", patch(vote_routes::vote_comment))
        .route("/username", patch(users::update_username));

    public_routes.merge(protected_routes)
}

async fn api_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "lithub",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
