// Repository trait abstractions for database operations
use crate::models::{Account, Comment, CommentVote, Post, PostVote, Subreddit, Subscription, User};
use crate::{AppError, Result};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<User>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Fails with `Conflict` when another user already holds the name
    async fn set_username(&self, id: Uuid, username: &str) -> Result<User>;
    async fn get_account(&self, provider: &str, provider_account_id: &str) -> Result<Option<Account>>;
    async fn link_account(&self, account: &Account) -> Result<Account>;
}

#[async_trait]
pub trait SubredditRepository: Send + Sync {
    /// Fails with `Conflict` when the name is taken. The creator, if any, is
    /// subscribed in the same write.
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit>;
    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>>;
    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>>;
    async fn subscribe(&self, subscription: &Subscription) -> Result<()>;
    /// Returns whether a subscription existed
    async fn unsubscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool>;
    async fn is_subscribed(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool>;
    async fn get_subscribed_subreddits(&self, user_id: Uuid) -> Result<Vec<Subreddit>>;
    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64>;
}

/// Which communities a post listing draws from
#[derive(Debug, Clone, PartialEq)]
pub enum PostFilter {
    All,
    Subreddits(Vec<Uuid>),
}

impl PostFilter {
    fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Subreddits(ids) => ids.contains(&post.subreddit_id),
        }
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &Post) -> Result<Post>;
    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>>;
    /// Newest first
    async fn get_posts_paginated(&self, filter: &PostFilter, limit: u32, offset: u32) -> Result<Vec<Post>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment>;
    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Oldest first
    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<PostVote>>;
    async fn upsert_post_vote(&self, vote: &PostVote) -> Result<PostVote>;
    async fn remove_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()>;
    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<PostVote>>;
    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>>;
    async fn upsert_comment_vote(&self, vote: &CommentVote) -> Result<CommentVote>;
    async fn remove_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()>;
    async fn get_comment_votes(&self, comment_id: Uuid) -> Result<Vec<CommentVote>>;
}

// In-memory implementations, used when no DATABASE_URL is configured and in tests
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalError("In-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<Uuid, User>>>, // id -> User
    accounts: Arc<Mutex<Vec<Account>>>,
}

#[derive(Default)]
pub struct InMemorySubredditRepository {
    subreddits: Arc<Mutex<HashMap<Uuid, Subreddit>>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts_list: Arc<Mutex<Vec<Post>>>, // insertion order
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: Arc<Mutex<Vec<Comment>>>,
}

#[derive(Default)]
pub struct InMemoryVoteRepository {
    post_votes: Arc<Mutex<HashMap<(Uuid, Uuid), PostVote>>>, // (user, post)
    comment_votes: Arc<Mutex<HashMap<(Uuid, Uuid), CommentVote>>>, // (user, comment)
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let mut users = guard(&self.users)?;
        if let Some(email) = &user.email {
            if users.values().any(|u| u.email.as_ref() == Some(email)) {
                return Err(AppError::Conflict(format!("A user with email {} already exists", email)));
            }
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(guard(&self.users)?.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = guard(&self.users)?;
        Ok(users.values().find(|u| u.email.as_deref() == Some(email)).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = guard(&self.users)?;
        Ok(users.values().find(|u| u.username.as_deref() == Some(username)).cloned())
    }

    async fn set_username(&self, id: Uuid, username: &str) -> Result<User> {
        let mut users = guard(&self.users)?;
        if users.values().any(|u| u.id != id && u.username.as_deref() == Some(username)) {
            return Err(AppError::Conflict("Username is taken".to_string()));
        }
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.username = Some(username.to_string());
        Ok(user.clone())
    }

    async fn get_account(&self, provider: &str, provider_account_id: &str) -> Result<Option<Account>> {
        let accounts = guard(&self.accounts)?;
        Ok(accounts
            .iter()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id)
            .cloned())
    }

    async fn link_account(&self, account: &Account) -> Result<Account> {
        let mut accounts = guard(&self.accounts)?;
        if accounts
            .iter()
            .any(|a| a.provider == account.provider && a.provider_account_id == account.provider_account_id)
        {
            return Err(AppError::Conflict("Account is already linked".to_string()));
        }
        accounts.push(account.clone());
        Ok(account.clone())
    }
}

impl InMemorySubredditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubredditRepository for InMemorySubredditRepository {
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit> {
        let mut subreddits = guard(&self.subreddits)?;
        let mut subscriptions = guard(&self.subscriptions)?;
        if subreddits.values().any(|s| s.name == subreddit.name) {
            return Err(AppError::Conflict("Subreddit already exists".to_string()));
        }
        subreddits.insert(subreddit.id, subreddit.clone());
        if let Some(creator_id) = subreddit.creator_id {
            subscriptions.push(Subscription { user_id: creator_id, subreddit_id: subreddit.id });
        }
        Ok(subreddit.clone())
    }

    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>> {
        Ok(guard(&self.subreddits)?.get(&id).cloned())
    }

    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>> {
        let subreddits = guard(&self.subreddits)?;
        Ok(subreddits.values().find(|s| s.name == name).cloned())
    }

    async fn subscribe(&self, subscription: &Subscription) -> Result<()> {
        let mut subscriptions = guard(&self.subscriptions)?;
        if subscriptions.contains(subscription) {
            return Err(AppError::Conflict("You've already subscribed to this subreddit".to_string()));
        }
        subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn unsubscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool> {
        let mut subscriptions = guard(&self.subscriptions)?;
        let before = subscriptions.len();
        subscriptions.retain(|s| !(s.user_id == user_id && s.subreddit_id == subreddit_id));
        Ok(subscriptions.len() != before)
    }

    async fn is_subscribed(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<bool> {
        let subscriptions = guard(&self.subscriptions)?;
        Ok(subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.subreddit_id == subreddit_id))
    }

    async fn get_subscribed_subreddits(&self, user_id: Uuid) -> Result<Vec<Subreddit>> {
        let subscribed: Vec<Uuid> = guard(&self.subscriptions)?
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.subreddit_id)
            .collect();
        let subreddits = guard(&self.subreddits)?;
        Ok(subscribed.iter().filter_map(|id| subreddits.get(id).cloned()).collect())
    }

    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64> {
        let subscriptions = guard(&self.subscriptions)?;
        Ok(subscriptions.iter().filter(|s| s.subreddit_id == subreddit_id).count() as i64)
    }
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create_post(&self, post: &Post) -> Result<Post> {
        guard(&self.posts_list)?.push(post.clone());
        Ok(post.clone())
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(guard(&self.posts_list)?.iter().find(|p| p.id == id).cloned())
    }

    async fn get_posts_paginated(&self, filter: &PostFilter, limit: u32, offset: u32) -> Result<Vec<Post>> {
        let posts_list = guard(&self.posts_list)?;
        // Newest insert first so equal timestamps still come out newest first
        let mut posts: Vec<Post> = posts_list.iter().rev().filter(|p| filter.matches(p)).cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        guard(&self.comments)?.push(comment.clone());
        Ok(comment.clone())
    }

    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(guard(&self.comments)?.iter().find(|c| c.id == id).cloned())
    }

    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = guard(&self.comments)?
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

impl InMemoryVoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteRepository for InMemoryVoteRepository {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<PostVote>> {
        Ok(guard(&self.post_votes)?.get(&(user_id, post_id)).cloned())
    }

    async fn upsert_post_vote(&self, vote: &PostVote) -> Result<PostVote> {
        guard(&self.post_votes)?.insert((vote.user_id, vote.post_id), vote.clone());
        Ok(vote.clone())
    }

    async fn remove_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        guard(&self.post_votes)?.remove(&(user_id, post_id));
        Ok(())
    }

    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<PostVote>> {
        Ok(guard(&self.post_votes)?
            .values()
            .filter(|v| v.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>> {
        Ok(guard(&self.comment_votes)?.get(&(user_id, comment_id)).cloned())
    }

    async fn upsert_comment_vote(&self, vote: &CommentVote) -> Result<CommentVote> {
        guard(&self.comment_votes)?.insert((vote.user_id, vote.comment_id), vote.clone());
        Ok(vote.clone())
    }

    async fn remove_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        guard(&self.comment_votes)?.remove(&(user_id, comment_id));
        Ok(())
    }

    async fn get_comment_votes(&self, comment_id: Uuid) -> Result<Vec<CommentVote>> {
        Ok(guard(&self.comment_votes)?
            .values()
            .filter(|v| v.comment_id == comment_id)
            .cloned()
            .collect())
    }
}
