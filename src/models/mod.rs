pub mod user;
pub mod subreddit;
pub mod post;
pub mod comment;
pub mod vote;

// Re-export models for convenience
pub use user::{Account, User, UserResponse};
pub use subreddit::{Subreddit, Subscription};
pub use post::Post;
pub use comment::Comment;
pub use vote::{CommentVote, PostVote, VoteType};
