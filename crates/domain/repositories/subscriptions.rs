use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// The row with `status = active` for the entity, regardless of whether
    /// its period has lapsed; callers decide on lazy expiration.
    async fn find_active_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn list_by_payment_id(&self, payment_id: Uuid) -> Result<Vec<SubscriptionEntity>>;

    async fn activate(
        &self,
        subscription_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn mark_past_due_by_payment_id(&self, payment_id: Uuid) -> Result<usize>;

    async fn mark_expired(&self, subscription_id: Uuid) -> Result<()>;

    /// Conditional on the row not already being canceled; returns the number
    /// of rows updated so concurrent double-cancels surface as a conflict.
    async fn cancel(&self, subscription_id: Uuid, canceled_at: DateTime<Utc>) -> Result<usize>;
}
