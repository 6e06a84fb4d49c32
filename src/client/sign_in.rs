use async_trait::async_trait;

use crate::client::{ClientError, Navigation, Notice, Toast};

/// Starts an OAuth sign-in and yields the URL to send the browser to
#[async_trait]
pub trait SignInProvider: Send + Sync {
    async fn sign_in(&self, provider: &str) -> Result<String, ClientError>;
}

/// The "Google" button of the sign-in modal
#[derive(Debug, Default)]
pub struct SignInForm {
    is_loading: bool,
}

impl SignInForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub async fn login_with_google(&mut self, provider: &dyn SignInProvider) -> Result<Navigation, Notice> {
        self.login_with(provider, "google").await
    }

    pub async fn login_with(&mut self, provider: &dyn SignInProvider, name: &str) -> Result<Navigation, Notice> {
        self.is_loading = true;
        let result = provider.sign_in(name).await;
        self.is_loading = false;

        result.map(Navigation::NavigateTo).map_err(|e| {
            tracing::warn!("⚠️ CLIENT: sign-in with {} failed: {}", name, e);
            Notice::Toast(Toast::destructive(
                "There was a problem.",
                "There was an error logging in with Google",
            ))
        })
    }
}
