//! Client-side behaviour of the web UI: the reply composer, the OAuth sign-in
//! button and modal navigation, expressed against the HTTP API.

pub mod api_client;
pub mod reply;
pub mod sign_in;

use std::fmt;

pub use api_client::{ApiClient, CommentApi};
pub use reply::ReplyComposer;
pub use sign_in::{SignInForm, SignInProvider};

pub const SIGN_IN_PATH: &str = "/sign-in";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn destructive(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: ToastVariant::Destructive,
        }
    }
}

/// Something to show the user after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast(Toast),
    /// Prompt pointing at the sign-in page
    SignInRequired,
}

impl Notice {
    pub fn toast(&self) -> Toast {
        match self {
            Notice::Toast(toast) => toast.clone(),
            Notice::SignInRequired => Toast {
                title: "Login required.".to_string(),
                description: "You need to be logged in to do that.".to_string(),
                variant: ToastVariant::Destructive,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    NavigateTo(String),
    Back,
    /// Re-fetch the current page's data
    Refresh,
    Stay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status
    Status(u16),
    Transport(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Status(401))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Status(status) => write!(f, "Request failed with status {}", status),
            ClientError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

/// Close button of the sign-in modal
pub fn close_modal() -> Navigation {
    Navigation::Back
}
