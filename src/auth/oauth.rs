// OAuth identity providers. Sign-in is delegated entirely to the provider;
// locally we only turn an authorization code into a profile.
use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::{AppError, Result};

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// What the provider tells us about the person signing in
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub provider_account_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email_verified: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Path segment and account provider key, e.g. "google"
    fn id(&self) -> &'static str;
    fn authorize_url(&self, state: &str) -> Result<String>;
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile>;
}

/// Opaque CSRF value round-tripped through the provider
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.oauth_redirect_uri("google"),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String> {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build Google authorize URL: {}", e)))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile> {
        let token_response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Google token request failed: {}", e)))?;

        if !token_response.status().is_success() {
            tracing::warn!("⚠️ OAUTH: Google rejected authorization code with status {}", token_response.status());
            return Err(AppError::AuthError("There was an error logging in with Google".to_string()));
        }

        let tokens: GoogleTokenResponse = token_response
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("Invalid Google token response: {}", e)))?;

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::InternalError(format!("Google userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("Invalid Google userinfo response: {}", e)))?;

        Ok(ProviderProfile {
            provider_account_id: info.sub,
            email: info.email,
            name: info.name,
            image: info.picture,
            email_verified: info.email_verified,
        })
    }
}
