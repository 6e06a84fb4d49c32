use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{UserResponse, VoteType};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    /// None for top-level comments
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// The comment a reply to this one should point at. Replies to a reply
    /// attach to its parent so threads stay two levels deep.
    pub fn reply_target(&self) -> Uuid {
        self.reply_to_id.unwrap_or(self.id)
    }
}

/// Body of `PATCH /api/subreddit/post/comment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub post_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub reply_to_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub post_id: Uuid,
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub author: UserResponse,
    pub votes_amt: i64,
    pub current_vote: Option<VoteType>,
    pub replies: Vec<CommentResponse>,
}
