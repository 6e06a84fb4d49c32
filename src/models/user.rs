use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    /// Handle shown as `u/<username>`; assigned on first sign-in when missing
    pub username: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: Option<String>, email: Option<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            email_verified: None,
            username: None,
            image,
            created_at: Utc::now(),
        }
    }
}

/// Link between a local user and an identity provider account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
}

/// Public author view; never carries the email address
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub image: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            image: user.image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub name: String,
}
