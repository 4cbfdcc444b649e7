use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;

#[automock]
#[async_trait]
pub trait PlanRepository {
    /// Batch resolution for checkout: only active plans come back, and ids
    /// that resolve to nothing are simply absent from the result.
    async fn find_active_by_ids(&self, plan_ids: Vec<Uuid>) -> Result<Vec<PlanEntity>>;

    /// Unfiltered batch resolution, used at activation time so a plan
    /// deactivated after checkout still yields its billing interval.
    async fn find_by_ids(&self, plan_ids: Vec<Uuid>) -> Result<Vec<PlanEntity>>;
}
