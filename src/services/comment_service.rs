use crate::db::repository::{CommentRepository, PostRepository, UserRepository};
use crate::models::comment::{CommentRequest, CommentResponse};
use crate::models::Comment;
use crate::services::VoteService;
use crate::{AppError, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
    user_repo: Arc<dyn UserRepository>,
    vote_service: Arc<VoteService>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
        user_repo: Arc<dyn UserRepository>,
        vote_service: Arc<VoteService>,
    ) -> Self {
        Self { comment_repo, post_repo, user_repo, vote_service }
    }

    /// Comment on a post, or reply to a comment when `reply_to_id` is set.
    /// Replies must target a comment of the same post.
    pub async fn create_comment(&self, author_id: Uuid, request: CommentRequest) -> Result<Comment> {
        if request.text.trim().is_empty() {
            return Err(AppError::ValidationError("Comment text cannot be empty".to_string()));
        }

        if self.post_repo.get_post_by_id(request.post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        if let Some(reply_to_id) = request.reply_to_id {
            let parent = self
                .comment_repo
                .get_comment_by_id(reply_to_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Comment being replied to not found".to_string()))?;
            if parent.post_id != request.post_id {
                return Err(AppError::ValidationError(
                    "Replies must belong to the same post as their parent".to_string(),
                ));
            }
        }

        let comment = self
            .comment_repo
            .create_comment(&Comment {
                id: Uuid::new_v4(),
                text: request.text,
                author_id,
                post_id: request.post_id,
                reply_to_id: request.reply_to_id,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!("💬 COMMENT: {} on post {} by {}", comment.id, comment.post_id, author_id);
        Ok(comment)
    }

    /// Threaded comments of a post, oldest first at every level
    pub async fn get_comments_for_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<Vec<CommentResponse>> {
        if self.post_repo.get_post_by_id(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comments = self.comment_repo.get_comments_by_post_id(post_id).await?;
        let mut flat = Vec::with_capacity(comments.len());
        for comment in comments {
            flat.push(self.to_response(comment, viewer).await?);
        }

        Ok(build_comment_tree(flat))
    }

    async fn to_response(&self, comment: Comment, viewer: Option<Uuid>) -> Result<CommentResponse> {
        let author = self
            .user_repo
            .get_user_by_id(comment.author_id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Comment {} has no author", comment.id)))?;
        let score = self.vote_service.comment_score(comment.id, viewer).await?;

        Ok(CommentResponse {
            id: comment.id,
            text: comment.text,
            post_id: comment.post_id,
            reply_to_id: comment.reply_to_id,
            created_at: comment.created_at,
            author: author.into(),
            votes_amt: score.votes_amt,
            current_vote: score.current_vote,
            replies: vec![],
        })
    }
}

/// Nest a flat, ordered comment list under its reply-to references.
/// Comments whose parent is not in the list are kept at the top level.
fn build_comment_tree(comments: Vec<CommentResponse>) -> Vec<CommentResponse> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.reply_to_id {
            Some(parent) if parent != comment.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    fn attach(node: &mut CommentResponse, children: &mut HashMap<Uuid, Vec<CommentResponse>>) {
        if let Some(mut replies) = children.remove(&node.id) {
            for reply in replies.iter_mut() {
                attach(reply, children);
            }
            node.replies = replies;
        }
    }

    for root in roots.iter_mut() {
        attach(root, &mut children);
    }
    roots
}
