use crate::db::repository::SubredditRepository;
use crate::models::subreddit::{CreateSubredditRequest, SubredditResponse};
use crate::models::{Subreddit, Subscription};
use crate::{AppError, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const NAME_MIN_LEN: usize = 3;
const NAME_MAX_LEN: usize = 21;

pub struct SubredditService {
    subreddit_repo: Arc<dyn SubredditRepository>,
}

impl SubredditService {
    pub fn new(subreddit_repo: Arc<dyn SubredditRepository>) -> Self {
        Self { subreddit_repo }
    }

    /// Create a community; the creator is subscribed to it straight away.
    pub async fn create_subreddit(&self, creator_id: Uuid, request: CreateSubredditRequest) -> Result<Subreddit> {
        let name = request.name.trim();
        let len = name.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            return Err(AppError::ValidationError(format!(
                "Subreddit name must be between {} and {} characters",
                NAME_MIN_LEN, NAME_MAX_LEN
            )));
        }

        if self.subreddit_repo.get_subreddit_by_name(name).await?.is_some() {
            return Err(AppError::Conflict("Subreddit already exists".to_string()));
        }

        let now = Utc::now();
        let subreddit = self
            .subreddit_repo
            .create_subreddit(&Subreddit {
                id: Uuid::new_v4(),
                name: name.to_string(),
                creator_id: Some(creator_id),
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!("🏘️ SUBREDDIT: r/{} created by {}", subreddit.name, creator_id);
        Ok(subreddit)
    }

    pub async fn subscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Subreddit> {
        let subreddit = self.require(subreddit_id).await?;
        if self.subreddit_repo.is_subscribed(user_id, subreddit_id).await? {
            return Err(AppError::Conflict("You've already subscribed to this subreddit".to_string()));
        }
        self.subreddit_repo
            .subscribe(&Subscription { user_id, subreddit_id })
            .await?;
        Ok(subreddit)
    }

    pub async fn unsubscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Subreddit> {
        let subreddit = self.require(subreddit_id).await?;
        if subreddit.creator_id == Some(user_id) {
            return Err(AppError::ValidationError(
                "You can't unsubscribe from your own subreddit".to_string(),
            ));
        }
        if !self.subreddit_repo.unsubscribe(user_id, subreddit_id).await? {
            return Err(AppError::ValidationError(
                "You've not been subscribed to this subreddit, yet.".to_string(),
            ));
        }
        Ok(subreddit)
    }

    pub async fn get_subreddit(&self, name: &str, viewer: Option<Uuid>) -> Result<SubredditResponse> {
        let subreddit = self
            .subreddit_repo
            .get_subreddit_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("r/{} does not exist", name)))?;

        let subscriber_count = self.subreddit_repo.count_subscribers(subreddit.id).await?;
        let is_subscribed = match viewer {
            Some(user_id) => self.subreddit_repo.is_subscribed(user_id, subreddit.id).await?,
            None => false,
        };

        Ok(SubredditResponse {
            id: subreddit.id,
            name: subreddit.name,
            creator_id: subreddit.creator_id,
            created_at: subreddit.created_at,
            subscriber_count,
            is_subscribed,
        })
    }

    async fn require(&self, subreddit_id: Uuid) -> Result<Subreddit> {
        self.subreddit_repo
            .get_subreddit_by_id(subreddit_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subreddit not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::InMemorySubredditRepository;

    fn service() -> SubredditService {
        SubredditService::new(Arc::new(InMemorySubredditRepository::new()))
    }

    fn named(name: &str) -> CreateSubredditRequest {
        CreateSubredditRequest { name: name.to_string() }
    }

    #[tokio::test]
    async fn test_creator_is_subscribed_and_names_are_unique() {
        let service = service();
        let creator = Uuid::new_v4();
        let subreddit = service.create_subreddit(creator, named("rustaceans")).await.unwrap();

        let view = service.get_subreddit("rustaceans", Some(creator)).await.unwrap();
        assert!(view.is_subscribed);
        assert_eq!(view.subscriber_count, 1);
        assert_eq!(view.id, subreddit.id);

        let err = service.create_subreddit(Uuid::new_v4(), named("rustaceans")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_name_length_is_checked() {
        let service = service();
        assert!(matches!(
            service.create_subreddit(Uuid::new_v4(), named("ab")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_subreddit(Uuid::new_v4(), named(&"a".repeat(22))).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe_cycle() {
        let service = service();
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let subreddit = service.create_subreddit(creator, named("gardening")).await.unwrap();

        service.subscribe(member, subreddit.id).await.unwrap();
        assert!(matches!(service.subscribe(member, subreddit.id).await, Err(AppError::Conflict(_))));

        service.unsubscribe(member, subreddit.id).await.unwrap();
        assert!(matches!(
            service.unsubscribe(member, subreddit.id).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.unsubscribe(creator, subreddit.id).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.subscribe(member, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
