pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod session;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use jwt::JwtService;

pub use middleware::{AuthSession, MaybeSession};
pub use session::{Session, SessionUser};

/// Claim set carried in the session JWT. Everything is optional because a
/// token starts out with whatever the identity provider supplied and is only
/// filled in from the database during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub token: SessionToken,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

pub struct AuthService {
    jwt: JwtService,
    max_age: Duration,
}

impl AuthService {
    pub fn new(jwt_secret: &str, max_age_days: i64) -> Self {
        Self {
            jwt: JwtService::new(jwt_secret),
            max_age: Duration::days(max_age_days),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn generate_token(&self, token: &SessionToken) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            token: token.clone(),
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
        };
        self.jwt.encode_token(&claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.jwt.decode_token(token)
    }
}
