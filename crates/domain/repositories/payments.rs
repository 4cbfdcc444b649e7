use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    payments::{CheckoutRecord, InsertPaymentEntity, PaymentEntity, PaymentTransition},
    subscriptions::InsertSubscriptionEntity,
};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    /// Persists one pending payment plus its pending subscriptions in a
    /// single serializable transaction. The per-entity eligibility check is
    /// repeated inside the transaction; losing that race surfaces an
    /// `ActiveSubscriptionConflict` through the error.
    async fn create_pending_checkout(
        &self,
        payment: InsertPaymentEntity,
        subscriptions: Vec<InsertSubscriptionEntity>,
    ) -> Result<CheckoutRecord>;

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentEntity>>;

    /// Atomic conditional update: applies the transition only while the row
    /// is still pending and returns the settled row, or `None` when another
    /// delivery won. This is the idempotency boundary for webhooks.
    async fn transition_from_pending(
        &self,
        payment_id: Uuid,
        transition: PaymentTransition,
    ) -> Result<Option<PaymentEntity>>;
}
