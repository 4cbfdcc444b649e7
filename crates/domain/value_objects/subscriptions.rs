use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: SubscriptionStatus,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for SubscriptionModel {
    fn from(entity: SubscriptionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            plan_id: entity.plan_id,
            payment_id: entity.payment_id,
            status: SubscriptionStatus::from_str(&entity.status),
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            entity_name: entity.entity_name,
            current_period_start: entity.starts_at,
            current_period_end: entity.ends_at,
            canceled_at: entity.canceled_at,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySubscriptionStatusModel {
    pub has_active_subscription: bool,
    pub subscription: Option<SubscriptionModel>,
}

/// Raised from inside the checkout insert transaction when another checkout
/// activated the same entity first. Carried through `anyhow` and downcast by
/// the use case so the caller sees a conflict, not an internal error.
#[derive(Debug, Clone)]
pub struct ActiveSubscriptionConflict {
    pub entity_type: String,
    pub entity_id: String,
}

impl std::fmt::Display for ActiveSubscriptionConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} already has an active subscription",
            self.entity_type, self.entity_id
        )
    }
}

impl std::error::Error for ActiveSubscriptionConflict {}
