use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "vote_type", rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn weight(self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostVote {
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentVote {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVoteRequest {
    pub post_id: Uuid,
    pub vote_type: VoteType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVoteRequest {
    pub comment_id: Uuid,
    pub vote_type: VoteType,
}

/// What casting a vote did to the voter's previous vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    Created,
    Switched,
    Removed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub votes_amt: i64,
    pub current_vote: Option<VoteType>,
}

/// Net score: upvotes minus downvotes
pub fn tally<I>(votes: I) -> i64
where
    I: IntoIterator<Item = VoteType>,
{
    votes.into_iter().map(VoteType::weight).sum()
}
