// Library modules for the community forum service
pub mod config;
pub mod models;
pub mod db;
pub mod routes;
pub mod services;
pub mod auth;
pub mod client;
pub mod error;

use std::sync::Arc;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use config::AppConfig;

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: db::DatabaseClient,
    pub auth_service: Arc<auth::AuthService>,
    pub identity_provider: Arc<dyn auth::oauth::IdentityProvider>,
    pub user_service: Arc<services::UserService>,
    pub subreddit_service: Arc<services::SubredditService>,
    pub post_service: Arc<services::PostService>,
    pub comment_service: Arc<services::CommentService>,
    pub vote_service: Arc<services::VoteService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = db::DatabaseClient::new(&config).await?;
        let identity_provider = Arc::new(auth::oauth::GoogleProvider::new(&config));
        Ok(Self::from_parts(config, db, identity_provider))
    }

    /// Wire services over an existing store and identity provider
    pub fn from_parts(
        config: AppConfig,
        db: db::DatabaseClient,
        identity_provider: Arc<dyn auth::oauth::IdentityProvider>,
    ) -> Self {
        let auth_service = Arc::new(auth::AuthService::new(&config.jwt_secret, config.session_max_age_days));
        let user_service = Arc::new(services::UserService::new(db.user_repo.clone()));
        let subreddit_service = Arc::new(services::SubredditService::new(db.subreddit_repo.clone()));

        let vote_service = Arc::new(services::VoteService::new(
            db.vote_repo.clone(),
            db.post_repo.clone(),
            db.comment_repo.clone(),
        ));

        let comment_service = Arc::new(services::CommentService::new(
            db.comment_repo.clone(),
            db.post_repo.clone(),
            db.user_repo.clone(),
            vote_service.clone(),
        ));

        let post_service = Arc::new(services::PostService::new(
            db.post_repo.clone(),
            db.subreddit_repo.clone(),
            db.user_repo.clone(),
            db.comment_repo.clone(),
            vote_service.clone(),
            config.feed_page_size,
        ));

        Self {
            config,
            db,
            auth_service,
            identity_provider,
            user_service,
            subreddit_service,
            post_service,
            comment_service,
            vote_service,
        }
    }
}
