//! Session token enrichment and the session view handed to clients.
//!
//! A freshly issued token only knows what the identity provider told us. On
//! every issuance it is topped up from the users table so the session always
//! carries the local id and username. Enrichment never blocks a sign-in: if the
//! store misbehaves the token goes out exactly as it came in.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::SessionToken;
use crate::db::repository::UserRepository;
use crate::models::User;
use crate::Result;

/// URL-safe alphabet used for generated usernames
const USERNAME_ALPHABET: &[u8; 64] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const GENERATED_USERNAME_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

/// Random 10 character handle for users who have not picked one yet.
pub fn generate_username() -> String {
    let mut bytes = [0u8; GENERATED_USERNAME_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| USERNAME_ALPHABET[(*b & 63) as usize] as char)
        .collect()
}

/// Fill `token` from the user record matching its email.
///
/// The email comes from the token itself, falling back to the user the
/// provider just signed in. Exactly five fields are copied: id, name, email,
/// image (as `picture`) and username. A user without a username gets a
/// generated one, persisted before the copy.
pub async fn enrich_token(
    users: &dyn UserRepository,
    token: SessionToken,
    signed_in_user: Option<&User>,
) -> SessionToken {
    let email = match token
        .email
        .clone()
        .or_else(|| signed_in_user.and_then(|u| u.email.clone()))
    {
        Some(email) => email,
        None => return token,
    };

    match lookup_and_copy(users, &token, &email).await {
        Ok(enriched) => enriched,
        Err(e) => {
            tracing::error!("🔐 AUTH: JWT callback error: {}", e);
            token
        }
    }
}

async fn lookup_and_copy(users: &dyn UserRepository, token: &SessionToken, email: &str) -> Result<SessionToken> {
    let mut db_user = match users.get_user_by_email(email).await? {
        Some(user) => user,
        None => return Ok(token.clone()),
    };

    if db_user.username.is_none() {
        let username = generate_username();
        tracing::info!("🔐 AUTH: Assigning generated username to user {}", db_user.id);
        db_user = users.set_username(db_user.id, &username).await?;
    }

    Ok(SessionToken {
        id: Some(db_user.id),
        name: db_user.name,
        email: db_user.email,
        picture: db_user.image,
        username: db_user.username,
    })
}

/// Project a verified token onto the session view. Tokens that never made it
/// through enrichment carry no id and yield no session.
pub fn session_from_token(token: &SessionToken, expires: DateTime<Utc>) -> Option<Session> {
    let id = token.id?;
    Some(Session {
        user: SessionUser {
            id,
            name: token.name.clone(),
            email: token.email.clone(),
            image: token.picture.clone(),
            username: token.username.clone(),
        },
        expires,
    })
}

/// Where the browser lands after any auth flow. Always same-site.
pub fn redirect_target() -> &'static str {
    "/"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::InMemoryUserRepository;
    use crate::models::Account;
    use crate::AppError;
    use async_trait::async_trait;

    struct FailingUserRepository;

    fn failure<T>() -> Result<T> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    #[async_trait]
    impl UserRepository for FailingUserRepository {
        async fn create_user(&self, _user: &User) -> Result<User> { failure() }
        async fn get_user_by_id(&self, _id: Uuid) -> Result<Option<User>> { failure() }
        async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>> { failure() }
        async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>> { failure() }
        async fn set_username(&self, _id: Uuid, _username: &str) -> Result<User> { failure() }
        async fn get_account(&self, _provider: &str, _id: &str) -> Result<Option<Account>> { failure() }
        async fn link_account(&self, _account: &Account) -> Result<Account> { failure() }
    }

    fn provider_token(email: &str) -> SessionToken {
        SessionToken {
            id: None,
            name: Some("Provider Name".to_string()),
            email: Some(email.to_string()),
            picture: Some("https://provider.example/pic.png".to_string()),
            username: None,
        }
    }

    async fn seeded_user(repo: &InMemoryUserRepository, username: Option<&str>) -> User {
        let mut user = User::new(
            Some("Ada Lovelace".to_string()),
            Some("ada@example.com".to_string()),
            Some("https://img.example/ada.png".to_string()),
        );
        user.username = username.map(str::to_string);
        repo.create_user(&user).await.unwrap()
    }

    #[tokio::test]
    async fn test_copies_exactly_five_fields_from_user_record() {
        let repo = InMemoryUserRepository::new();
        let user = seeded_user(&repo, Some("ada")).await;

        let token = enrich_token(&repo, provider_token("ada@example.com"), None).await;

        assert_eq!(
            token,
            SessionToken {
                id: Some(user.id),
                name: Some("Ada Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                picture: Some("https://img.example/ada.png".to_string()),
                username: Some("ada".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_username_is_generated_and_persisted() {
        let repo = InMemoryUserRepository::new();
        let user = seeded_user(&repo, None).await;

        let token = enrich_token(&repo, provider_token("ada@example.com"), None).await;

        let username = token.username.expect("username should be set on the token");
        assert_eq!(username.len(), GENERATED_USERNAME_LEN);
        let stored = repo.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.username.as_deref(), Some(username.as_str()));
    }

    #[tokio::test]
    async fn test_lookup_failure_returns_original_token() {
        let original = provider_token("ada@example.com");
        let token = enrich_token(&FailingUserRepository, original.clone(), None).await;
        assert_eq!(token, original);
    }

    #[tokio::test]
    async fn test_unknown_email_leaves_token_unchanged() {
        let repo = InMemoryUserRepository::new();
        let original = provider_token("nobody@example.com");
        assert_eq!(enrich_token(&repo, original.clone(), None).await, original);
    }

    #[tokio::test]
    async fn test_no_email_anywhere_leaves_token_unchanged() {
        let original = SessionToken::default();
        // The failing repository proves no lookup is attempted
        assert_eq!(enrich_token(&FailingUserRepository, original.clone(), None).await, original);
    }

    #[tokio::test]
    async fn test_falls_back_to_signed_in_user_email() {
        let repo = InMemoryUserRepository::new();
        let user = seeded_user(&repo, Some("ada")).await;

        let token = enrich_token(&repo, SessionToken::default(), Some(&user)).await;
        assert_eq!(token.id, Some(user.id));
        assert_eq!(token.username.as_deref(), Some("ada"));
    }

    #[test]
    fn test_generated_usernames_use_url_safe_alphabet() {
        let name = generate_username();
        assert_eq!(name.len(), GENERATED_USERNAME_LEN);
        assert!(name.bytes().all(|b| USERNAME_ALPHABET.contains(&b)));
        assert_ne!(generate_username(), generate_username());
    }

    #[test]
    fn test_session_projection() {
        let id = Uuid::new_v4();
        let token = SessionToken {
            id: Some(id),
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            picture: Some("pic".to_string()),
            username: Some("ada".to_string()),
        };
        let session = session_from_token(&token, Utc::now()).unwrap();
        assert_eq!(session.user.id, id);
        assert_eq!(session.user.image.as_deref(), Some("pic"));
        assert_eq!(session.user.username.as_deref(), Some("ada"));

        assert!(session_from_token(&SessionToken::default(), Utc::now()).is_none());
    }

    #[test]
    fn test_redirects_stay_on_site() {
        assert_eq!(redirect_target(), "/");
    }
}
