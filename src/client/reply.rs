use uuid::Uuid;

use crate::auth::session::Session;
use crate::client::api_client::CommentApi;
use crate::client::{Navigation, Notice, Toast, SIGN_IN_PATH};
use crate::models::comment::CommentRequest;
use crate::models::Comment;

/// Reply box under a comment
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    post_id: Uuid,
    reply_to_id: Uuid,
    is_replying: bool,
    input: String,
    is_loading: bool,
}

impl ReplyComposer {
    pub fn new(post_id: Uuid, comment: &Comment) -> Self {
        Self {
            post_id,
            reply_to_id: comment.reply_target(),
            is_replying: false,
            input: String::new(),
            is_loading: false,
        }
    }

    pub fn is_replying(&self) -> bool {
        self.is_replying
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Reply button. Signed-out users are sent to sign in instead.
    pub fn open(&mut self, session: Option<&Session>) -> Navigation {
        if session.is_none() {
            return Navigation::NavigateTo(SIGN_IN_PATH.to_string());
        }
        self.is_replying = true;
        Navigation::Stay
    }

    pub fn cancel(&mut self) {
        self.is_replying = false;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the Post button is enabled
    pub fn can_submit(&self) -> bool {
        !self.input.is_empty() && !self.is_loading
    }

    pub fn request(&self) -> CommentRequest {
        CommentRequest {
            post_id: self.post_id,
            text: self.input.clone(),
            reply_to_id: Some(self.reply_to_id),
        }
    }

    pub async fn submit(&mut self, api: &dyn CommentApi) -> Result<Navigation, Notice> {
        if !self.can_submit() {
            return Ok(Navigation::Stay);
        }

        self.is_loading = true;
        let result = api.reply(&self.request()).await;
        self.is_loading = false;

        match result {
            Ok(()) => {
                self.input.clear();
                Ok(Navigation::Refresh)
            }
            Err(e) if e.is_unauthorized() => Err(Notice::SignInRequired),
            Err(e) => {
                tracing::warn!("⚠️ CLIENT: reply failed: {}", e);
                Err(Notice::Toast(Toast::destructive(
                    "There was a problem.",
                    "Something went wrong. Please try again.",
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SessionUser;
    use crate::client::{ClientError, ToastVariant};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Answers every reply with a fixed result and records what it was sent
    struct StubApi {
        result: Result<(), ClientError>,
        sent: Mutex<Vec<CommentRequest>>,
    }

    impl StubApi {
        fn new(result: Result<(), ClientError>) -> Self {
            Self { result, sent: Mutex::new(vec![]) }
        }
    }

    #[async_trait]
    impl CommentApi for StubApi {
        async fn reply(&self, request: &CommentRequest) -> Result<(), ClientError> {
            self.sent.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }

    fn comment(reply_to_id: Option<Uuid>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            text: "parent".to_string(),
            author_id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            reply_to_id,
            created_at: Utc::now(),
        }
    }

    fn session() -> Session {
        Session {
            user: SessionUser {
                id: Uuid::new_v4(),
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                image: None,
                username: Some("ada".into()),
            },
            expires: Utc::now(),
        }
    }

    fn open_composer(parent: &Comment, text: &str) -> ReplyComposer {
        let mut composer = ReplyComposer::new(parent.post_id, parent);
        assert_eq!(composer.open(Some(&session())), Navigation::Stay);
        composer.set_input(text);
        composer
    }

    #[test]
    fn test_signed_out_open_redirects_to_sign_in() {
        let mut composer = ReplyComposer::new(Uuid::new_v4(), &comment(None));
        assert_eq!(composer.open(None), Navigation::NavigateTo("/sign-in".to_string()));
        assert!(!composer.is_replying());
    }

    #[test]
    fn test_post_button_disabled_on_empty_input() {
        let mut composer = open_composer(&comment(None), "");
        assert!(!composer.can_submit());
        composer.set_input("x");
        assert!(composer.can_submit());
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let api = StubApi::new(Ok(()));
        let mut composer = open_composer(&comment(None), "");
        assert_eq!(composer.submit(&api).await, Ok(Navigation::Stay));
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_targets_thread_root() {
        let root_id = Uuid::new_v4();
        let nested = comment(Some(root_id));
        let api = StubApi::new(Ok(()));
        let mut composer = open_composer(&nested, "agreed");

        assert_eq!(composer.submit(&api).await, Ok(Navigation::Refresh));
        assert_eq!(composer.input(), "");
        assert!(!composer.is_loading());

        let sent = api.sent.lock().unwrap();
        assert_eq!(sent[0].reply_to_id, Some(root_id));
        assert_eq!(sent[0].post_id, nested.post_id);
        assert_eq!(sent[0].text, "agreed");
    }

    #[tokio::test]
    async fn test_unauthorized_prompts_sign_in_not_generic_toast() {
        let api = StubApi::new(Err(ClientError::Status(401)));
        let mut composer = open_composer(&comment(None), "hello");

        assert_eq!(composer.submit(&api).await, Err(Notice::SignInRequired));
        // Input survives a failed submit
        assert_eq!(composer.input(), "hello");
        assert!(!composer.is_loading());
    }

    #[tokio::test]
    async fn test_other_errors_show_generic_toast() {
        for error in [ClientError::Status(500), ClientError::Transport("connection reset".into())] {
            let api = StubApi::new(Err(error));
            let mut composer = open_composer(&comment(None), "hello");

            match composer.submit(&api).await {
                Err(Notice::Toast(toast)) => {
                    assert_eq!(toast.title, "There was a problem.");
                    assert_eq!(toast.description, "Something went wrong. Please try again.");
                    assert_eq!(toast.variant, ToastVariant::Destructive);
                }
                other => panic!("expected generic toast, got {:?}", other),
            }
        }
    }
}
