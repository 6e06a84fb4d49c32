use crate::db::repository::{CommentRepository, PostFilter, PostRepository, SubredditRepository, UserRepository};
use crate::models::post::{CreatePostRequest, ExtendedPost, FeedQuery, SubredditSummary};
use crate::models::Post;
use crate::services::VoteService;
use crate::{AppError, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

// Validation constants
const TITLE_MIN_LEN: usize = 3;
const TITLE_MAX_LEN: usize = 128;
const MAX_LIMIT: u32 = 50;

pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    subreddit_repo: Arc<dyn SubredditRepository>,
    user_repo: Arc<dyn UserRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    vote_service: Arc<VoteService>,
    page_size: u32,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        subreddit_repo: Arc<dyn SubredditRepository>,
        user_repo: Arc<dyn UserRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        vote_service: Arc<VoteService>,
        page_size: u32,
    ) -> Self {
        Self {
            post_repo,
            subreddit_repo,
            user_repo,
            comment_repo,
            vote_service,
            page_size: page_size.max(1),
        }
    }

    /// Only subscribers may post into a community
    pub async fn create_post(&self, author_id: Uuid, request: CreatePostRequest) -> Result<Post> {
        let title_len = request.title.trim().chars().count();
        if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&title_len) {
            return Err(AppError::ValidationError(format!(
                "Title must be between {} and {} characters",
                TITLE_MIN_LEN, TITLE_MAX_LEN
            )));
        }

        if self.subreddit_repo.get_subreddit_by_id(request.subreddit_id).await?.is_none() {
            return Err(AppError::NotFound("Subreddit not found".to_string()));
        }
        if !self.subreddit_repo.is_subscribed(author_id, request.subreddit_id).await? {
            return Err(AppError::Forbidden("Subscribe to post".to_string()));
        }

        let now = Utc::now();
        let post = self
            .post_repo
            .create_post(&Post {
                id: Uuid::new_v4(),
                title: request.title.trim().to_string(),
                content: request.content,
                author_id,
                subreddit_id: request.subreddit_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!("📝 POST: {} created in {} by {}", post.id, post.subreddit_id, author_id);
        Ok(post)
    }

    pub async fn get_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<ExtendedPost> {
        let post = self
            .post_repo
            .get_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        self.extend(post, viewer).await
    }

    /// First page of a signed-in user's home feed: newest posts from the
    /// communities they follow.
    pub async fn custom_feed(&self, user_id: Uuid) -> Result<Vec<ExtendedPost>> {
        let filter = self.followed_filter(user_id).await?;
        self.list(&filter, self.page_size, 0, Some(user_id)).await
    }

    /// First page of the signed-out home feed
    pub async fn general_feed(&self) -> Result<Vec<ExtendedPost>> {
        self.list(&PostFilter::All, self.page_size, 0, None).await
    }

    /// Infinite-scroll listing behind `GET /api/posts`. `page` is 1-based.
    pub async fn get_posts(&self, query: FeedQuery, viewer: Option<Uuid>) -> Result<Vec<ExtendedPost>> {
        let limit = query.limit.unwrap_or(self.page_size).clamp(1, MAX_LIMIT);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(limit);

        let filter = match (&query.subreddit_name, viewer) {
            (Some(name), _) => match self.subreddit_repo.get_subreddit_by_name(name).await? {
                Some(subreddit) => PostFilter::Subreddits(vec![subreddit.id]),
                None => PostFilter::Subreddits(vec![]),
            },
            (None, Some(user_id)) => self.followed_filter(user_id).await?,
            (None, None) => PostFilter::All,
        };

        self.list(&filter, limit, offset, viewer).await
    }

    async fn followed_filter(&self, user_id: Uuid) -> Result<PostFilter> {
        let followed = self.subreddit_repo.get_subscribed_subreddits(user_id).await?;
        Ok(PostFilter::Subreddits(followed.into_iter().map(|s| s.id).collect()))
    }

    async fn list(&self, filter: &PostFilter, limit: u32, offset: u32, viewer: Option<Uuid>) -> Result<Vec<ExtendedPost>> {
        let posts = self.post_repo.get_posts_paginated(filter, limit, offset).await?;
        let mut extended = Vec::with_capacity(posts.len());
        for post in posts {
            extended.push(self.extend(post, viewer).await?);
        }
        Ok(extended)
    }

    async fn extend(&self, post: Post, viewer: Option<Uuid>) -> Result<ExtendedPost> {
        let author = self
            .user_repo
            .get_user_by_id(post.author_id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Post {} has no author", post.id)))?;
        let subreddit = self
            .subreddit_repo
            .get_subreddit_by_id(post.subreddit_id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Post {} has no subreddit", post.id)))?;
        let votes = self.vote_service.post_votes(post.id).await?;
        let score = VoteService::score_post_votes(&votes, viewer);
        let comments = self.comment_repo.get_comments_by_post_id(post.id).await?;

        Ok(ExtendedPost {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            author: author.into(),
            subreddit: SubredditSummary { id: subreddit.id, name: subreddit.name },
            votes,
            comments,
            votes_amt: score.votes_amt,
            current_vote: score.current_vote,
        })
    }
}
