pub mod api;
pub mod auth;
pub mod comments;
pub mod extract;
pub mod posts;
pub mod subreddits;
pub mod users;
pub mod vote_routes;
pub mod web;

use axum::Router;
use crate::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(web::routes())
        .nest("/api", api::routes())
}
