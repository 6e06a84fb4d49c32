use async_trait::async_trait;
use reqwest::{redirect::Policy, header::LOCATION, StatusCode};

use crate::client::sign_in::SignInProvider;
use crate::client::ClientError;
use crate::models::comment::CommentRequest;

#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn reply(&self, request: &CommentRequest) -> Result<(), ClientError>;
}

/// Thin HTTP client over the JSON API
pub struct ApiClient {
    base_url: String,
    session_token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // The sign-in endpoint answers with a redirect we want to see, not follow
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: None,
            http,
        })
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

#[async_trait]
impl CommentApi for ApiClient {
    async fn reply(&self, request: &CommentRequest) -> Result<(), ClientError> {
        let response = self
            .authorize(self.http.patch(self.url("/api/subreddit/post/comment")))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl SignInProvider for ApiClient {
    async fn sign_in(&self, provider: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/auth/signin/{}", provider)))
            .send()
            .await
            .map_err(transport)?;

        if response.status() != StatusCode::FOUND {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Transport("Sign-in redirect without a location".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.url("/api/posts"), "http://localhost:5000/api/posts");
    }
}
