use crate::auth::oauth::ProviderProfile;
use crate::db::repository::UserRepository;
use crate::models::{Account, User};
use crate::{AppError, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

pub fn validate_username(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AppError::ValidationError(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::ValidationError(
            "Username may only contain letters, numbers and underscores".to_string(),
        ));
    }
    Ok(())
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.user_repo.get_user_by_id(user_id).await
    }

    pub async fn update_username(&self, user_id: Uuid, name: &str) -> Result<User> {
        validate_username(name)?;

        if let Some(existing) = self.user_repo.get_user_by_username(name).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict("Username is taken".to_string()));
            }
        }

        let user = self.user_repo.set_username(user_id, name).await?;
        tracing::info!("👤 USER: {} changed username to {}", user_id, name);
        Ok(user)
    }

    /// Resolve the local user behind a provider sign-in: an already linked
    /// account wins, then a user with the same email gets the account linked,
    /// otherwise a new user is created.
    pub async fn find_or_create_oauth_user(&self, provider: &str, profile: &ProviderProfile) -> Result<User> {
        if let Some(account) = self.user_repo.get_account(provider, &profile.provider_account_id).await? {
            return self
                .user_repo
                .get_user_by_id(account.user_id)
                .await?
                .ok_or_else(|| AppError::InternalError(format!("Account {} points at a missing user", account.id)));
        }

        let user = match &profile.email {
            Some(email) => self.user_repo.get_user_by_email(email).await?,
            None => None,
        };

        let user = match user {
            Some(user) => user,
            None => {
                let mut user = User::new(profile.name.clone(), profile.email.clone(), profile.image.clone());
                if profile.email_verified {
                    user.email_verified = Some(Utc::now());
                }
                let created = self.user_repo.create_user(&user).await?;
                tracing::info!("👤 USER: Created user {} from {} sign-in", created.id, provider);
                created
            }
        };

        self.user_repo
            .link_account(&Account {
                id: Uuid::new_v4(),
                user_id: user.id,
                provider: provider.to_string(),
                provider_account_id: profile.provider_account_id.clone(),
            })
            .await?;

        Ok(user)
    }
}
