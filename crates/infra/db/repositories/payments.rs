use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{payments, subscriptions},
    },
};
use domain::{
    entities::{
        payments::{CheckoutRecord, InsertPaymentEntity, PaymentEntity, PaymentTransition},
        subscriptions::InsertSubscriptionEntity,
    },
    repositories::payments::PaymentRepository,
    value_objects::{
        enums::{
            payment_statuses::PaymentStatus, subscription_statuses::SubscriptionStatus,
        },
        subscriptions::ActiveSubscriptionConflict,
    },
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn create_pending_checkout(
        &self,
        payment: InsertPaymentEntity,
        new_subscriptions: Vec<InsertSubscriptionEntity>,
    ) -> Result<CheckoutRecord> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = conn
            .build_transaction()
            .serializable()
            .run::<_, anyhow::Error, _>(|conn| {
                // Re-check the one-active-subscription-per-entity invariant
                // inside the transaction; the use case's earlier check can
                // lose against a concurrent checkout.
                for subscription in &new_subscriptions {
                    let existing = subscriptions::table
                        .filter(subscriptions::entity_type.eq(&subscription.entity_type))
                        .filter(subscriptions::entity_id.eq(&subscription.entity_id))
                        .filter(
                            subscriptions::status.eq(SubscriptionStatus::Active.to_string()),
                        )
                        .filter(subscriptions::ends_at.gt(Utc::now()))
                        .select(subscriptions::id)
                        .first::<Uuid>(conn)
                        .optional()?;

                    if existing.is_some() {
                        return Err(anyhow!(ActiveSubscriptionConflict {
                            entity_type: subscription.entity_type.clone(),
                            entity_id: subscription.entity_id.clone(),
                        }));
                    }
                }

                let payment_id = insert_into(payments::table)
                    .values(&payment)
                    .returning(payments::id)
                    .get_result::<Uuid>(conn)?;

                let new_subscriptions = new_subscriptions
                    .into_iter()
                    .map(|mut subscription| {
                        subscription.payment_id = Some(payment_id);
                        subscription
                    })
                    .collect::<Vec<_>>();

                let subscription_ids = insert_into(subscriptions::table)
                    .values(&new_subscriptions)
                    .returning(subscriptions::id)
                    .get_results::<Uuid>(conn)?;

                Ok(CheckoutRecord {
                    payment_id,
                    subscription_ids,
                })
            })?;

        Ok(record)
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::id.eq(payment_id))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::reference.eq(reference))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn transition_from_pending(
        &self,
        payment_id: Uuid,
        transition: PaymentTransition,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Single conditional update; the pending filter makes re-deliveries
        // and concurrent duplicates settle the row at most once.
        let settled = update(payments::table)
            .filter(payments::id.eq(payment_id))
            .filter(payments::status.eq(PaymentStatus::Pending.to_string()))
            .set((
                payments::status.eq(transition.status.to_string()),
                payments::provider_transaction_id.eq(transition.provider_transaction_id),
                payments::payment_method.eq(transition.payment_method),
                payments::failure_reason.eq(transition.failure_reason),
                payments::provider_response.eq(transition.provider_response),
                payments::paid_at.eq(transition.paid_at),
            ))
            .returning(PaymentEntity::as_returning())
            .get_result::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(settled)
    }
}
