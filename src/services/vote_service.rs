use std::sync::Arc;
use uuid::Uuid;

use crate::db::repository::{CommentRepository, PostRepository, VoteRepository};
use crate::models::vote::{tally, CommentVoteRequest, PostVoteRequest, VoteOutcome, VoteResponse};
use crate::models::{CommentVote, PostVote, VoteType};
use crate::{AppError, Result};

/// Up/down votes on posts and comments. Casting the same vote twice takes it
/// back; casting the opposite vote flips it.
pub struct VoteService {
    vote_repo: Arc<dyn VoteRepository>,
    post_repo: Arc<dyn PostRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

/// Score of a post or comment as seen by one viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub votes_amt: i64,
    pub current_vote: Option<VoteType>,
}

fn resolve(existing: Option<VoteType>, requested: VoteType) -> VoteOutcome {
    match existing {
        Some(previous) if previous == requested => VoteOutcome::Removed,
        Some(_) => VoteOutcome::Switched,
        None => VoteOutcome::Created,
    }
}

fn score<I>(votes: I, viewer: Option<Uuid>) -> Score
where
    I: IntoIterator<Item = (Uuid, VoteType)>,
{
    let votes: Vec<(Uuid, VoteType)> = votes.into_iter().collect();
    let current_vote = viewer.and_then(|viewer| {
        votes
            .iter()
            .find(|(user_id, _)| *user_id == viewer)
            .map(|(_, vote_type)| *vote_type)
    });
    Score {
        votes_amt: tally(votes.iter().map(|(_, vote_type)| *vote_type)),
        current_vote,
    }
}

impl VoteService {
    pub fn new(
        vote_repo: Arc<dyn VoteRepository>,
        post_repo: Arc<dyn PostRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self { vote_repo, post_repo, comment_repo }
    }

    pub async fn vote_post(&self, user_id: Uuid, request: PostVoteRequest) -> Result<VoteResponse> {
        if self.post_repo.get_post_by_id(request.post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let existing = self.vote_repo.get_post_vote(user_id, request.post_id).await?;
        let outcome = resolve(existing.map(|v| v.vote_type), request.vote_type);
        match outcome {
            VoteOutcome::Removed => self.vote_repo.remove_post_vote(user_id, request.post_id).await?,
            VoteOutcome::Created | VoteOutcome::Switched => {
                self.vote_repo
                    .upsert_post_vote(&PostVote {
                        user_id,
                        post_id: request.post_id,
                        vote_type: request.vote_type,
                    })
                    .await?;
            }
        }

        tracing::debug!("🗳️ VOTE: post {} by {}: {:?}", request.post_id, user_id, outcome);
        let score = self.post_score(request.post_id, Some(user_id)).await?;
        Ok(VoteResponse {
            outcome,
            votes_amt: score.votes_amt,
            current_vote: score.current_vote,
        })
    }

    pub async fn vote_comment(&self, user_id: Uuid, request: CommentVoteRequest) -> Result<VoteResponse> {
        if self.comment_repo.get_comment_by_id(request.comment_id).await?.is_none() {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        let existing = self.vote_repo.get_comment_vote(user_id, request.comment_id).await?;
        let outcome = resolve(existing.map(|v| v.vote_type), request.vote_type);
        match outcome {
            VoteOutcome::Removed => self.vote_repo.remove_comment_vote(user_id, request.comment_id).await?,
            VoteOutcome::Created | VoteOutcome::Switched => {
                self.vote_repo
                    .upsert_comment_vote(&CommentVote {
                        user_id,
                        comment_id: request.comment_id,
                        vote_type: request.vote_type,
                    })
                    .await?;
            }
        }

        tracing::debug!("🗳️ VOTE: comment {} by {}: {:?}", request.comment_id, user_id, outcome);
        let score = self.comment_score(request.comment_id, Some(user_id)).await?;
        Ok(VoteResponse {
            outcome,
            votes_amt: score.votes_amt,
            current_vote: score.current_vote,
        })
    }

    pub async fn post_votes(&self, post_id: Uuid) -> Result<Vec<PostVote>> {
        self.vote_repo.get_post_votes(post_id).await
    }

    pub fn score_post_votes(votes: &[PostVote], viewer: Option<Uuid>) -> Score {
        score(votes.iter().map(|v| (v.user_id, v.vote_type)), viewer)
    }

    pub async fn post_score(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<Score> {
        let votes = self.vote_repo.get_post_votes(post_id).await?;
        Ok(Self::score_post_votes(&votes, viewer))
    }

    pub async fn comment_score(&self, comment_id: Uuid, viewer: Option<Uuid>) -> Result<Score> {
        let votes = self.vote_repo.get_comment_votes(comment_id).await?;
        Ok(score(votes.iter().map(|v| (v.user_id, v.vote_type)), viewer))
    }
}
