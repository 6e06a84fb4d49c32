pub mod user_service;
pub mod subreddit_service;
pub mod post_service;
pub mod comment_service;
pub mod vote_service;

// Re-export services for convenience
pub use user_service::UserService;
pub use subreddit_service::SubredditService;
pub use post_service::PostService;
pub use comment_service::CommentService;
pub use vote_service::VoteService;
