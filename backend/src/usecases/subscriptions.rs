use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::{entity_types::EntityType, subscription_statuses::SubscriptionStatus},
        subscriptions::{EntitySubscriptionStatusModel, SubscriptionModel},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("subscription not found")]
    NotFound,
    #[error("subscription does not belong to the acting user")]
    Forbidden,
    #[error("subscription is already canceled")]
    AlreadyCanceled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::NotFound => StatusCode::NOT_FOUND,
            SubscriptionError::Forbidden => StatusCode::FORBIDDEN,
            SubscriptionError::AlreadyCanceled => StatusCode::CONFLICT,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Who is asking for the cancellation. Owners must own the row; admins may
/// cancel any.
#[derive(Debug, Clone, Copy)]
pub enum CancelActor {
    User(Uuid),
    Admin(Uuid),
}

pub struct SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    /// Is the entity currently entitled to its listing benefits? An active
    /// row whose period has lapsed is corrected to `expired` before the
    /// answer goes out.
    pub async fn entity_status(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> UseCaseResult<EntitySubscriptionStatusModel> {
        let existing = self
            .subscription_repo
            .find_active_for_entity(entity_type.as_str(), entity_id)
            .await
            .map_err(|err| {
                error!(
                    %entity_type,
                    entity_id,
                    db_error = ?err,
                    "subscriptions: failed to load entity subscription"
                );
                SubscriptionError::Internal(err)
            })?;

        let Some(subscription) = existing else {
            return Ok(EntitySubscriptionStatusModel {
                has_active_subscription: false,
                subscription: None,
            });
        };

        if Utc::now() > subscription.ends_at {
            self.subscription_repo
                .mark_expired(subscription.id)
                .await
                .map_err(|err| {
                    error!(
                        subscription_id = %subscription.id,
                        db_error = ?err,
                        "subscriptions: failed to persist lazy expiration"
                    );
                    SubscriptionError::Internal(err)
                })?;
            info!(
                subscription_id = %subscription.id,
                "subscriptions: lazily expired on read"
            );

            let mut model = SubscriptionModel::from(subscription);
            model.status = SubscriptionStatus::Expired;
            return Ok(EntitySubscriptionStatusModel {
                has_active_subscription: false,
                subscription: Some(model),
            });
        }

        Ok(EntitySubscriptionStatusModel {
            has_active_subscription: true,
            subscription: Some(SubscriptionModel::from(subscription)),
        })
    }

    /// Cancellation only blocks renewal; the already-paid period stays
    /// untouched, so neither the period nor the payment is modified here.
    pub async fn cancel(
        &self,
        subscription_id: Uuid,
        actor: CancelActor,
    ) -> UseCaseResult<SubscriptionModel> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to load subscription"
                );
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = SubscriptionError::NotFound;
                warn!(
                    %subscription_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: cancel target not found"
                );
                err
            })?;

        if let CancelActor::User(user_id) = actor {
            if subscription.user_id != user_id {
                let err = SubscriptionError::Forbidden;
                warn!(
                    %subscription_id,
                    %user_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: cancel denied for non-owner"
                );
                return Err(err);
            }
        }

        if subscription.status == SubscriptionStatus::Canceled.to_string() {
            let err = SubscriptionError::AlreadyCanceled;
            warn!(
                %subscription_id,
                status = err.status_code().as_u16(),
                "subscriptions: double cancel rejected"
            );
            return Err(err);
        }

        let canceled_at = Utc::now();
        let canceled = self
            .subscription_repo
            .cancel(subscription_id, canceled_at)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to cancel subscription"
                );
                SubscriptionError::Internal(err)
            })?;

        if canceled == 0 {
            // A concurrent cancel won between the read and the update.
            let err = SubscriptionError::AlreadyCanceled;
            warn!(
                %subscription_id,
                status = err.status_code().as_u16(),
                "subscriptions: double cancel rejected"
            );
            return Err(err);
        }

        info!(
            %subscription_id,
            actor = ?actor,
            "subscriptions: subscription canceled"
        );

        let mut model = SubscriptionModel::from(subscription);
        model.status = SubscriptionStatus::Canceled;
        model.canceled_at = Some(canceled_at);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::subscriptions::MockSubscriptionRepository,
    };

    fn subscription(status: SubscriptionStatus, ends_in_days: i64) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            payment_id: Some(Uuid::new_v4()),
            status: status.to_string(),
            entity_type: "lodging".to_string(),
            entity_id: "lodging-1".to_string(),
            entity_name: "Lodging One".to_string(),
            starts_at: now - Duration::days(5),
            ends_at: now + Duration::days(ends_in_days),
            canceled_at: None,
            created_at: now - Duration::days(5),
        }
    }

    #[tokio::test]
    async fn reports_active_subscription() {
        let active = subscription(SubscriptionStatus::Active, 25);

        let mut repo = MockSubscriptionRepository::new();
        let found = active.clone();
        repo.expect_find_active_for_entity()
            .withf(|entity_type, entity_id| entity_type == "lodging" && entity_id == "lodging-1")
            .returning(move |_, _| Ok(Some(found.clone())));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let status = usecase
            .entity_status(EntityType::Lodging, "lodging-1")
            .await
            .unwrap();

        assert!(status.has_active_subscription);
        assert_eq!(status.subscription.unwrap().id, active.id);
    }

    #[tokio::test]
    async fn reports_no_subscription() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_active_for_entity()
            .returning(|_, _| Ok(None));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let status = usecase
            .entity_status(EntityType::Guide, "guide-1")
            .await
            .unwrap();

        assert!(!status.has_active_subscription);
        assert!(status.subscription.is_none());
    }

    #[tokio::test]
    async fn lazily_expires_lapsed_subscription_on_read() {
        let lapsed = subscription(SubscriptionStatus::Active, -1);
        let lapsed_id = lapsed.id;

        let mut repo = MockSubscriptionRepository::new();
        let found = lapsed.clone();
        repo.expect_find_active_for_entity()
            .returning(move |_, _| Ok(Some(found.clone())));
        repo.expect_mark_expired()
            .withf(move |id| *id == lapsed_id)
            .returning(|_| Ok(()));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let status = usecase
            .entity_status(EntityType::Lodging, "lodging-1")
            .await
            .unwrap();

        assert!(!status.has_active_subscription);
        let model = status.subscription.unwrap();
        assert_eq!(model.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn owner_cancels_own_subscription() {
        let active = subscription(SubscriptionStatus::Active, 25);
        let owner = active.user_id;
        let subscription_id = active.id;

        let mut repo = MockSubscriptionRepository::new();
        let found = active.clone();
        repo.expect_find_by_id()
            .withf(move |id| *id == subscription_id)
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_cancel()
            .withf(move |id, _| *id == subscription_id)
            .returning(|_, _| Ok(1));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let model = usecase
            .cancel(subscription_id, CancelActor::User(owner))
            .await
            .unwrap();

        assert_eq!(model.status, SubscriptionStatus::Canceled);
        assert!(model.canceled_at.is_some());
    }

    #[tokio::test]
    async fn non_owner_cannot_cancel() {
        let active = subscription(SubscriptionStatus::Active, 25);

        let mut repo = MockSubscriptionRepository::new();
        let found = active.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let err = usecase
            .cancel(active.id, CancelActor::User(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Forbidden));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_cancels_any_subscription() {
        let active = subscription(SubscriptionStatus::Active, 25);

        let mut repo = MockSubscriptionRepository::new();
        let found = active.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_cancel().returning(|_, _| Ok(1));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let model = usecase
            .cancel(active.id, CancelActor::Admin(Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(model.status, SubscriptionStatus::Canceled);
    }

    #[tokio::test]
    async fn double_cancel_is_a_conflict() {
        let mut canceled = subscription(SubscriptionStatus::Canceled, 25);
        let original_canceled_at = Utc::now() - Duration::days(1);
        canceled.canceled_at = Some(original_canceled_at);
        let owner = canceled.user_id;

        let mut repo = MockSubscriptionRepository::new();
        let found = canceled.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        // No cancel expectation: the repository must not be written again,
        // so canceled_at cannot change.

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let err = usecase
            .cancel(canceled.id, CancelActor::User(owner))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadyCanceled));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn concurrent_double_cancel_is_a_conflict() {
        let active = subscription(SubscriptionStatus::Active, 25);
        let owner = active.user_id;

        let mut repo = MockSubscriptionRepository::new();
        let found = active.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_cancel().returning(|_, _| Ok(0));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let err = usecase
            .cancel(active.id, CancelActor::User(owner))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadyCanceled));
    }

    #[tokio::test]
    async fn cancel_missing_subscription_is_not_found() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let usecase = SubscriptionUseCase::new(Arc::new(repo));
        let err = usecase
            .cancel(Uuid::new_v4(), CancelActor::Admin(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::NotFound));
    }
}
