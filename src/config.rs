use std::env;

use crate::{AppError, Result};

/// Number of posts returned per infinite-scroll page.
pub const INFINITE_SCROLL_PAGINATION_RESULTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    /// `None` runs against the in-memory store
    pub database_url: Option<String>,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Externally visible origin, used to build the OAuth redirect URI
    pub public_url: String,
    pub session_max_age_days: i64,
    pub feed_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            jwt_secret: "dev-secret-change-in-production".to_string(),
            database_url: None,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            public_url: "http://localhost:5000".to_string(),
            session_max_age_days: 30,
            feed_page_size: INFINITE_SCROLL_PAGINATION_RESULTS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let google_client_id = env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty());
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET").ok().filter(|v| !v.is_empty());
        let (google_client_id, google_client_secret) = match (google_client_id, google_client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(AppError::InternalError(
                    "Google client ID or secret is not set in the environment variables.".to_string(),
                ))
            }
        };

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server_port),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            google_client_id,
            google_client_secret,
            public_url: env::var("PUBLIC_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
            session_max_age_days: env::var("SESSION_MAX_AGE_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .filter(|d| *d > 0)
                .unwrap_or(defaults.session_max_age_days),
            feed_page_size: env::var("FEED_PAGE_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.feed_page_size),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn oauth_redirect_uri(&self, provider: &str) -> String {
        format!("{}/api/auth/callback/{}", self.public_url, provider)
    }
}
