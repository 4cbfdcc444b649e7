use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use anyhow::Context;
use chrono::Utc;
use crates::{
    domain::{
        entities::{
            payments::InsertPaymentEntity, plans::PlanEntity,
            subscriptions::InsertSubscriptionEntity,
        },
        repositories::{
            payments::PaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            checkout::{CheckoutItemModel, CheckoutLineModel, CheckoutSessionModel, format_minor},
            enums::{payment_statuses::PaymentStatus, subscription_statuses::SubscriptionStatus},
            subscriptions::ActiveSubscriptionConflict,
        },
    },
    payments::{gateway::PayGateClient, reference},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart must contain at least one item")]
    EmptyCart,
    #[error("{entity_type} {entity_id} already has an active subscription")]
    EntityAlreadySubscribed {
        entity_type: String,
        entity_id: String,
    },
    #[error("plan not found: {0}")]
    PlanNotFound(Uuid),
    #[error("cart items must share a single currency")]
    MixedCurrencies,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckoutError::EmptyCart | CheckoutError::MixedCurrencies => StatusCode::BAD_REQUEST,
            CheckoutError::EntityAlreadySubscribed { .. } => StatusCode::CONFLICT,
            CheckoutError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CheckoutError>;

pub struct CheckoutUseCase<P, S, Pay>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    payment_repo: Arc<Pay>,
    gateway: Arc<PayGateClient>,
}

impl<P, S, Pay> CheckoutUseCase<P, S, Pay>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        subscription_repo: Arc<S>,
        payment_repo: Arc<Pay>,
        gateway: Arc<PayGateClient>,
    ) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            payment_repo,
            gateway,
        }
    }

    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        items: Vec<CheckoutItemModel>,
    ) -> UseCaseResult<CheckoutSessionModel> {
        info!(%user_id, item_count = items.len(), "checkout: requested");

        if items.is_empty() {
            let err = CheckoutError::EmptyCart;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "checkout: empty cart rejected"
            );
            return Err(err);
        }

        let now = Utc::now();

        self.ensure_entities_eligible(user_id, &items).await?;

        let plans_by_id = self.resolve_plans(user_id, &items).await?;

        let currency = plans_by_id[&items[0].plan_id].currency.clone();
        if plans_by_id.values().any(|plan| plan.currency != currency) {
            let err = CheckoutError::MixedCurrencies;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "checkout: cart mixes currencies"
            );
            return Err(err);
        }

        let amount_minor: i32 = items
            .iter()
            .map(|item| plans_by_id[&item.plan_id].price_minor)
            .sum();

        let payment_reference = reference::generate();

        let payment = InsertPaymentEntity {
            user_id,
            reference: payment_reference.clone(),
            amount_minor,
            currency: currency.clone(),
            status: PaymentStatus::Pending.to_string(),
        };

        let new_subscriptions = items
            .iter()
            .map(|item| {
                let plan = &plans_by_id[&item.plan_id];
                let ends_at = plan
                    .interval()
                    .period_end_from(now)
                    .context("failed to compute subscription period end")?;

                Ok(InsertSubscriptionEntity {
                    user_id,
                    plan_id: item.plan_id,
                    payment_id: None,
                    status: SubscriptionStatus::Pending.to_string(),
                    entity_type: item.entity_type.to_string(),
                    entity_id: item.entity_id.clone(),
                    entity_name: item.entity_name.clone(),
                    starts_at: now,
                    ends_at,
                })
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        let record = self
            .payment_repo
            .create_pending_checkout(payment, new_subscriptions)
            .await
            .map_err(|err| match err.downcast_ref::<ActiveSubscriptionConflict>() {
                Some(conflict) => {
                    let conflict_err = CheckoutError::EntityAlreadySubscribed {
                        entity_type: conflict.entity_type.clone(),
                        entity_id: conflict.entity_id.clone(),
                    };
                    warn!(
                        %user_id,
                        status = conflict_err.status_code().as_u16(),
                        "checkout: entity was subscribed by a concurrent checkout"
                    );
                    conflict_err
                }
                None => {
                    error!(
                        %user_id,
                        db_error = ?err,
                        "checkout: failed to persist pending checkout"
                    );
                    CheckoutError::Internal(err)
                }
            })?;

        let signature = self
            .gateway
            .widget_signature(&payment_reference, amount_minor, &currency);
        let redirect_url = self.gateway.redirect_url(record.payment_id);

        let lines = items
            .iter()
            .map(|item| {
                let plan = &plans_by_id[&item.plan_id];
                CheckoutLineModel {
                    entity_name: item.entity_name.clone(),
                    plan_name: plan.name.clone(),
                    price_in_cents: plan.price_minor,
                    price: format_minor(plan.price_minor),
                }
            })
            .collect();

        info!(
            %user_id,
            payment_id = %record.payment_id,
            reference = %payment_reference,
            amount_minor,
            subscription_count = record.subscription_ids.len(),
            "checkout: pending payment created"
        );

        Ok(CheckoutSessionModel {
            payment_id: record.payment_id,
            reference: payment_reference,
            amount_in_cents: amount_minor,
            amount: format_minor(amount_minor),
            currency,
            public_key: self.gateway.public_key().to_string(),
            signature,
            redirect_url,
            items: lines,
        })
    }

    /// Fails the whole checkout if any cart entity already holds an active,
    /// unexpired subscription. Lapsed rows found on the way are corrected to
    /// `expired` instead of blocking the purchase.
    async fn ensure_entities_eligible(
        &self,
        user_id: Uuid,
        items: &[CheckoutItemModel],
    ) -> UseCaseResult<()> {
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for item in items {
            let key = (item.entity_type.to_string(), item.entity_id.clone());
            if !seen.insert(key) {
                continue;
            }

            let existing = self
                .subscription_repo
                .find_active_for_entity(item.entity_type.as_str(), &item.entity_id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        entity_type = %item.entity_type,
                        entity_id = %item.entity_id,
                        db_error = ?err,
                        "checkout: failed to check entity eligibility"
                    );
                    CheckoutError::Internal(err)
                })?;

            let Some(subscription) = existing else {
                continue;
            };

            if Utc::now() <= subscription.ends_at {
                let err = CheckoutError::EntityAlreadySubscribed {
                    entity_type: item.entity_type.to_string(),
                    entity_id: item.entity_id.clone(),
                };
                warn!(
                    %user_id,
                    entity_type = %item.entity_type,
                    entity_id = %item.entity_id,
                    status = err.status_code().as_u16(),
                    "checkout: entity already has an active subscription"
                );
                return Err(err);
            }

            // Period lapsed without any read noticing; persist the
            // correction and let the checkout proceed.
            self.subscription_repo
                .mark_expired(subscription.id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        subscription_id = %subscription.id,
                        db_error = ?err,
                        "checkout: failed to expire lapsed subscription"
                    );
                    CheckoutError::Internal(err)
                })?;
            info!(
                subscription_id = %subscription.id,
                "checkout: lapsed subscription expired on read"
            );
        }

        Ok(())
    }

    async fn resolve_plans(
        &self,
        user_id: Uuid,
        items: &[CheckoutItemModel],
    ) -> UseCaseResult<HashMap<Uuid, PlanEntity>> {
        let mut plan_ids: Vec<Uuid> = items.iter().map(|item| item.plan_id).collect();
        plan_ids.sort_unstable();
        plan_ids.dedup();

        let plans = self
            .plan_repo
            .find_active_by_ids(plan_ids.clone())
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "checkout: failed to resolve plans"
                );
                CheckoutError::Internal(err)
            })?;

        let plans_by_id: HashMap<Uuid, PlanEntity> =
            plans.into_iter().map(|plan| (plan.id, plan)).collect();

        for plan_id in &plan_ids {
            if !plans_by_id.contains_key(plan_id) {
                let err = CheckoutError::PlanNotFound(*plan_id);
                warn!(
                    %user_id,
                    %plan_id,
                    status = err.status_code().as_u16(),
                    "checkout: cart references an unknown or inactive plan"
                );
                return Err(err);
            }
        }

        Ok(plans_by_id)
    }
}
