use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, PostVote, UserResponse, VoteType};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Editor document, stored as-is
    pub content: Option<serde_json::Value>,
    pub author_id: Uuid,
    pub subreddit_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    pub subreddit_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubredditSummary {
    pub id: Uuid,
    pub name: String,
}

/// A post with its votes, comments, author and community attached,
/// the shape the feed renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPost {
    pub id: Uuid,
    pub title: String,
    pub content: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub author: UserResponse,
    pub subreddit: SubredditSummary,
    pub votes: Vec<PostVote>,
    pub comments: Vec<Comment>,
    pub votes_amt: i64,
    pub current_vote: Option<VoteType>,
}

/// `GET /api/posts` query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub subreddit_name: Option<String>,
}
