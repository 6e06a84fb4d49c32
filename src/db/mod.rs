pub mod postgres;
pub mod repository;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::Result;
use repository::{
    CommentRepository, InMemoryCommentRepository, InMemoryPostRepository, InMemorySubredditRepository,
    InMemoryUserRepository, InMemoryVoteRepository, PostRepository, SubredditRepository, UserRepository,
    VoteRepository,
};

// Repository handles shared by every service
#[derive(Clone)]
pub struct DatabaseClient {
    pub user_repo: Arc<dyn UserRepository>,
    pub subreddit_repo: Arc<dyn SubredditRepository>,
    pub post_repo: Arc<dyn PostRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub vote_repo: Arc<dyn VoteRepository>,
}

impl DatabaseClient {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let database = postgres::PostgresDatabase::new(url).await?;
                database.migrate().await?;
                Ok(Self {
                    user_repo: Arc::new(database.user_repo()),
                    subreddit_repo: Arc::new(database.subreddit_repo()),
                    post_repo: Arc::new(database.post_repo()),
                    comment_repo: Arc::new(database.comment_repo()),
                    vote_repo: Arc::new(database.vote_repo()),
                })
            }
            None => {
                tracing::warn!("⚠️ DATABASE: DATABASE_URL not set, data lives in memory for this process only");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            user_repo: Arc::new(InMemoryUserRepository::new()),
            subreddit_repo: Arc::new(InMemorySubredditRepository::new()),
            post_repo: Arc::new(InMemoryPostRepository::new()),
            comment_repo: Arc::new(InMemoryCommentRepository::new()),
            vote_repo: Arc::new(InMemoryVoteRepository::new()),
        }
    }
}
