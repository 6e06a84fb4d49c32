// PostgreSQL repository implementations using sqlx
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;
use std::sync::Arc;
use std::time::Duration;
use crate::{Result, AppError};
use crate::models::{Account, Comment, CommentVote, Post, PostVote, Subreddit, Subscription, User};
use crate::db::repository::{
    CommentRepository, PostFilter, PostRepository, SubredditRepository, UserRepository, VoteRepository,
};

const UNIQUE_VIOLATION: &str = "23505";

fn db_error(context: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}

// PostgreSQL connection pool wrapper
pub struct PostgresDatabase {
    pub pool: Arc<PgPool>,
}

impl PostgresDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        tracing::info!("🔗 DATABASE: Configuring connection pool");
        tracing::info!("   📊 Max connections: 20");
        tracing::info!("   ⏰ Connection timeout: 30s");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!("❌ DATABASE: Failed to create connection pool: {}", e);
                AppError::DatabaseError(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        tracing::info!("✅ DATABASE: Connection pool configured successfully");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Apply the schema in `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("✅ DATABASE: Migrations applied");
        Ok(())
    }

    pub fn user_repo(&self) -> PostgresUserRepository {
        PostgresUserRepository { pool: self.pool.clone() }
    }

    pub fn subreddit_repo(&self) -> PostgresSubredditRepository {
        PostgresSubredditRepository { pool: self.pool.clone() }
    }

    pub fn post_repo(&self) -> PostgresPostRepository {
        PostgresPostRepository { pool: self.pool.clone() }
    }

    pub fn comment_repo(&self) -> PostgresCommentRepository {
        PostgresCommentRepository { pool: self.pool.clone() }
    }

    pub fn vote_repo(&self) -> PostgresVoteRepository {
        PostgresVoteRepository { pool: self.pool.clone() }
    }
}

const USER_COLUMNS: &str = "id, name, email, email_verified, username, image, created_at";

// PostgreSQL User Repository
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let query = format!(
            "INSERT INTO users (id, name, email, email_verified, username, image, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.email_verified)
            .bind(&user.username)
            .bind(&user.image)
            .bind(user.created_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("A user with this email already exists".to_string())
                } else {
                    db_error("Failed to create user", e)
                }
            })
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get user by id", e))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get user by email", e))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get user by username", e))
    }

    async fn set_username(&self, id: Uuid, username: &str) -> Result<User> {
        let query = format!("UPDATE users SET username = $2 WHERE id = $1 RETURNING {}", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Username is taken".to_string())
                } else {
                    db_error("Failed to update username", e)
                }
            })?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn get_account(&self, provider: &str, provider_account_id: &str) -> Result<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT id, user_id, provider, provider_account_id FROM accounts
             WHERE provider = $1 AND provider_account_id = $2",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get account", e))
    }

    async fn link_account(&self, account: &Account) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, user_id, provider, provider_account_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, provider, provider_account_id",
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Account is already linked".to_string())
            } else {
                db_error("Failed to link account", e)
            }
        })
    }
}

const SUBREDDIT_COLUMNS: &str = "id, name, creator_id, created_at, updated_at";

// PostgreSQL Subreddit Repository
pub struct PostgresSubredditRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl SubredditRepository for PostgresSubredditRepository {
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit> {
        // Community row and creator subscription commit together
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start subreddit transaction", e))?;

        let query = format!(
            "INSERT INTO subreddits (id, name, creator_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            SUBREDDIT_COLUMNS
        );
        let created = sqlx::query_as::<_, Subreddit>(&query)
            .bind(subreddit.id)
            .bind(&subreddit.name)
            .bind(subreddit.creator_id)
            .bind(subreddit.created_at)
            .bind(subreddit.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Subreddit already exists".to_string())
                } else {
                    db_error("Failed to create subreddit", e)
                }
            })?;

        if let Some(creator_id) = created.creator_id {
            sqlx::query("INSERT INTO subscriptions (user_id, subreddit_id) VALUES ($1, $2)")
                .bind(creator_id)
                .bind(created.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to subscribe subreddit creator", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit subreddit transaction", e))?;
        Ok(created)
    }

    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>> {
        let query = format!("SELECT {} FROM subreddits WHERE id = $1", SUBREDDIT_COLUMNS);
        sqlx::query_as::<_, Subreddit>(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get subreddit by id", e))
    }

    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>> {
        let query = format!("SELECT {} FROM subreddits WHERE name = $1", SUBREDDIT_COLUMNS);
        sqlx::query_as::<_, Subreddit>(&query)
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get subreddit by name", e))
    }

    async fn subscribe(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query("INSERT INTO subscriptions (user_id, subreddit_id) VALUES ($1, $2)")
            .bind(subscription.user_id)
            .bind(subscription.subreddit_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("You've already subscribed to this subreddit".to_string())
                } else {
                    db_error("Failed to subscribe", e)
                }
            })?;
        Ok(())
    }

    async fn unsubscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND subreddit_id = $2")
            .bind(user_id)
            .bind(subreddit_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to unsubscribe", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_subscribed(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND subreddit_id = $2)",
        )
        .bind(user_id)
        .bind(subreddit_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to check subscription", e))?;
        Ok(exists)
    }

    async fn get_subscribed_subreddits(&self, user_id: Uuid) -> Result<Vec<Subreddit>> {
        sqlx::query_as::<_, Subreddit>(
            "SELECT s.id, s.name, s.creator_id, s.created_at, s.updated_at
             FROM subscriptions sub JOIN subreddits s ON s.id = sub.subreddit_id
             WHERE sub.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get subscriptions", e))
    }

    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE subreddit_id = $1")
            .bind(subreddit_id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to count subscribers", e))?;
        Ok(count)
    }
}

const POST_COLUMNS: &str = "id, title, content, author_id, subreddit_id, created_at, updated_at";

// PostgreSQL Post Repository
pub struct PostgresPostRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, post: &Post) -> Result<Post> {
        let query = format!(
            "INSERT INTO posts (id, title, content, author_id, subreddit_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(post.id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.author_id)
            .bind(post.subreddit_id)
            .bind(post.created_at)
            .bind(post.updated_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to create post", e))
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get post", e))
    }

    async fn get_posts_paginated(&self, filter: &PostFilter, limit: u32, offset: u32) -> Result<Vec<Post>> {
        let posts = match filter {
            PostFilter::All => {
                let query = format!(
                    "SELECT {} FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                    POST_COLUMNS
                );
                sqlx::query_as::<_, Post>(&query)
                    .bind(limit as i64)
                    .bind(offset as i64)
                    .fetch_all(&*self.pool)
                    .await
            }
            PostFilter::Subreddits(ids) => {
                let query = format!(
                    "SELECT {} FROM posts WHERE subreddit_id = ANY($1)
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                    POST_COLUMNS
                );
                sqlx::query_as::<_, Post>(&query)
                    .bind(ids.as_slice())
                    .bind(limit as i64)
                    .bind(offset as i64)
                    .fetch_all(&*self.pool)
                    .await
            }
        };
        posts.map_err(|e| db_error("Failed to get posts", e))
    }
}

const COMMENT_COLUMNS: &str = "id, text, author_id, post_id, reply_to_id, created_at";

// PostgreSQL Comment Repository
pub struct PostgresCommentRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        let query = format!(
            "INSERT INTO comments (id, text, author_id, post_id, reply_to_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            COMMENT_COLUMNS
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(comment.id)
            .bind(&comment.text)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .bind(comment.reply_to_id)
            .bind(comment.created_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to create comment", e))
    }

    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let query = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get comment", e))
    }

    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let query = format!(
            "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at ASC",
            COMMENT_COLUMNS
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get comments", e))
    }
}

// PostgreSQL Vote Repository
pub struct PostgresVoteRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<PostVote>> {
        sqlx::query_as::<_, PostVote>(
            "SELECT user_id, post_id, vote_type FROM post_votes WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get post vote", e))
    }

    async fn upsert_post_vote(&self, vote: &PostVote) -> Result<PostVote> {
        sqlx::query_as::<_, PostVote>(
            "INSERT INTO post_votes (user_id, post_id, vote_type) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, post_id) DO UPDATE SET vote_type = EXCLUDED.vote_type
             RETURNING user_id, post_id, vote_type",
        )
        .bind(vote.user_id)
        .bind(vote.post_id)
        .bind(vote.vote_type)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to cast post vote", e))
    }

    async fn remove_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM post_votes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to remove post vote", e))?;
        Ok(())
    }

    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<PostVote>> {
        sqlx::query_as::<_, PostVote>("SELECT user_id, post_id, vote_type FROM post_votes WHERE post_id = $1")
            .bind(post_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get post votes", e))
    }

    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>> {
        sqlx::query_as::<_, CommentVote>(
            "SELECT user_id, comment_id, vote_type FROM comment_votes WHERE user_id = $1 AND comment_id = $2",
        )
        .bind(user_id)
        .bind(comment_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get comment vote", e))
    }

    async fn upsert_comment_vote(&self, vote: &CommentVote) -> Result<CommentVote> {
        sqlx::query_as::<_, CommentVote>(
            "INSERT INTO comment_votes (user_id, comment_id, vote_type) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, comment_id) DO UPDATE SET vote_type = EXCLUDED.vote_type
             RETURNING user_id, comment_id, vote_type",
        )
        .bind(vote.user_id)
        .bind(vote.comment_id)
        .bind(vote.vote_type)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to cast comment vote", e))
    }

    async fn remove_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM comment_votes WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to remove comment vote", e))?;
        Ok(())
    }

    async fn get_comment_votes(&self, comment_id: Uuid) -> Result<Vec<CommentVote>> {
        sqlx::query_as::<_, CommentVote>(
            "SELECT user_id, comment_id, vote_type FROM comment_votes WHERE comment_id = $1",
        )
        .bind(comment_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get comment votes", e))
    }
}
