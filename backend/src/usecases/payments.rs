use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result as AnyResult, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use crates::{
    domain::{
        entities::payments::PaymentTransition,
        repositories::{
            payments::PaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::payment_statuses::PaymentStatus,
            payments::{GatewayEventModel, PaymentModel},
        },
    },
    payments::gateway::{GatewayTransaction, PayGateClient, map_transaction_status},
    payments::signature,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Seam over the gateway client so the use case stays testable without a
/// network. The shared secret also rides here because the webhook verifier
/// is a pure function of (event, secret, checksum).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayGateway: Send + Sync {
    async fn fetch_transaction(&self, reference: &str) -> AnyResult<GatewayTransaction>;

    fn shared_secret(&self) -> &str;
}

#[async_trait]
impl PayGateway for PayGateClient {
    async fn fetch_transaction(&self, reference: &str) -> AnyResult<GatewayTransaction> {
        self.fetch_transaction(reference).await
    }

    fn shared_secret(&self) -> &str {
        self.shared_secret()
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid webhook checksum")]
    InvalidChecksum,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("payment not found")]
    PaymentNotFound,
    #[error("payment does not belong to the acting user")]
    Forbidden,
    #[error("invalid override status: {0}")]
    InvalidOverrideStatus(String),
    #[error("payment is no longer pending")]
    AlreadySettled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::InvalidChecksum
            | PaymentError::InvalidWebhook(_)
            | PaymentError::InvalidOverrideStatus(_) => StatusCode::BAD_REQUEST,
            PaymentError::PaymentNotFound => StatusCode::NOT_FOUND,
            PaymentError::Forbidden => StatusCode::FORBIDDEN,
            PaymentError::AlreadySettled => StatusCode::CONFLICT,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

pub struct PaymentUseCase<Pay, S, P, Gate>
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Gate: PayGateway + Send + Sync + 'static,
{
    payment_repo: Arc<Pay>,
    subscription_repo: Arc<S>,
    plan_repo: Arc<P>,
    gateway: Arc<Gate>,
}

impl<Pay, S, P, Gate> PaymentUseCase<Pay, S, P, Gate>
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Gate: PayGateway + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<Pay>,
        subscription_repo: Arc<S>,
        plan_repo: Arc<P>,
        gateway: Arc<Gate>,
    ) -> Self {
        Self {
            payment_repo,
            subscription_repo,
            plan_repo,
            gateway,
        }
    }

    /// Webhook ingestion: verify, map the gateway vocabulary, settle the
    /// ledger row at most once, then drive the subscription batch. Unknown
    /// references and re-deliveries return `Ok` so the gateway stops
    /// retrying.
    pub async fn process_gateway_event(
        &self,
        event: serde_json::Value,
        checksum: &str,
    ) -> UseCaseResult<()> {
        if !signature::verify_event_checksum(&event, self.gateway.shared_secret(), checksum) {
            let err = PaymentError::InvalidChecksum;
            warn!(
                status = err.status_code().as_u16(),
                "payments: webhook checksum verification failed"
            );
            return Err(err);
        }

        let raw_transaction = event.pointer("/data/transaction").cloned();

        let envelope: GatewayEventModel = serde_json::from_value(event).map_err(|err| {
            warn!(error = %err, "payments: malformed webhook envelope");
            PaymentError::InvalidWebhook("malformed event envelope".to_string())
        })?;
        let transaction = envelope.data.transaction;

        info!(
            event_type = %envelope.event,
            reference = %transaction.reference,
            gateway_status = %transaction.status,
            "payments: gateway webhook verified"
        );

        let payment = match self
            .payment_repo
            .find_by_reference(&transaction.reference)
            .await
            .map_err(|err| {
                error!(
                    reference = %transaction.reference,
                    db_error = ?err,
                    "payments: failed to look up payment by reference"
                );
                PaymentError::Internal(err)
            })? {
            Some(payment) => payment,
            None => {
                // May belong to an unrelated flow or be a stale retry;
                // acknowledged so the gateway stops re-delivering.
                warn!(
                    reference = %transaction.reference,
                    "payments: webhook references an unknown payment"
                );
                return Ok(());
            }
        };

        let mapped = map_transaction_status(&transaction.status);
        let transition = PaymentTransition {
            status: mapped,
            provider_transaction_id: transaction.id.clone(),
            payment_method: transaction.payment_method.clone(),
            failure_reason: match mapped {
                PaymentStatus::Approved => None,
                _ => transaction.message.clone(),
            },
            provider_response: raw_transaction,
            paid_at: (mapped == PaymentStatus::Approved).then(Utc::now),
        };

        let settled = self
            .payment_repo
            .transition_from_pending(payment.id, transition)
            .await
            .map_err(|err| {
                error!(
                    payment_id = %payment.id,
                    db_error = ?err,
                    "payments: failed to settle payment"
                );
                PaymentError::Internal(err)
            })?;

        let Some(settled) = settled else {
            info!(
                payment_id = %payment.id,
                "payments: re-delivery for an already settled payment ignored"
            );
            return Ok(());
        };

        self.apply_subscription_outcome(settled.id, mapped).await?;

        info!(
            payment_id = %settled.id,
            status = %mapped,
            "payments: payment settled from webhook"
        );

        Ok(())
    }

    /// Operator-facing forced transition for offline payments and support
    /// corrections. Obeys the same only-from-pending rule as the webhook but
    /// surfaces re-settlement as a conflict instead of acknowledging it.
    pub async fn override_status(
        &self,
        payment_id: Uuid,
        requested_status: &str,
        reason: Option<String>,
        acting_admin: Uuid,
    ) -> UseCaseResult<PaymentModel> {
        let status = PaymentStatus::from_str(requested_status)
            .filter(PaymentStatus::is_terminal)
            .ok_or_else(|| {
                let err = PaymentError::InvalidOverrideStatus(requested_status.to_string());
                warn!(
                    %payment_id,
                    %acting_admin,
                    status = err.status_code().as_u16(),
                    "payments: override with invalid status"
                );
                err
            })?;

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to load payment");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = PaymentError::PaymentNotFound;
                warn!(
                    %payment_id,
                    %acting_admin,
                    status = err.status_code().as_u16(),
                    "payments: override target not found"
                );
                err
            })?;

        let transition = PaymentTransition {
            status,
            provider_transaction_id: None,
            payment_method: Some("manual".to_string()),
            failure_reason: match status {
                PaymentStatus::Approved => None,
                _ => reason,
            },
            provider_response: None,
            paid_at: (status == PaymentStatus::Approved).then(Utc::now),
        };

        let settled = self
            .payment_repo
            .transition_from_pending(payment.id, transition)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to settle payment");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = PaymentError::AlreadySettled;
                warn!(
                    %payment_id,
                    %acting_admin,
                    status = err.status_code().as_u16(),
                    "payments: override on a settled payment rejected"
                );
                err
            })?;

        self.apply_subscription_outcome(settled.id, status).await?;

        info!(
            %payment_id,
            %acting_admin,
            status = %status,
            "payments: payment settled by administrative override"
        );

        Ok(PaymentModel::from(settled))
    }

    /// Owner-scoped ledger read. While the row is pending the gateway's live
    /// status is attached best-effort: the redirect landing page polls this
    /// before the webhook lands, and a lookup failure only means the field
    /// is absent.
    pub async fn get_payment(
        &self,
        payment_id: Uuid,
        acting_user_id: Uuid,
        acting_is_admin: bool,
    ) -> UseCaseResult<PaymentModel> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to load payment");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::PaymentNotFound)?;

        if payment.user_id != acting_user_id && !acting_is_admin {
            let err = PaymentError::Forbidden;
            warn!(
                %payment_id,
                %acting_user_id,
                status = err.status_code().as_u16(),
                "payments: payment read denied"
            );
            return Err(err);
        }

        let pending = payment.status == PaymentStatus::Pending.to_string();
        let reference = payment.reference.clone();
        let mut model = PaymentModel::from(payment);

        if pending {
            match self.gateway.fetch_transaction(&reference).await {
                Ok(transaction) => model.gateway_status = transaction.status,
                Err(err) => warn!(
                    %payment_id,
                    error = %err,
                    "payments: gateway status lookup failed; returning local state"
                ),
            }
        }

        Ok(model)
    }

    async fn apply_subscription_outcome(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> UseCaseResult<()> {
        match status {
            PaymentStatus::Approved => self.activate_all(payment_id).await,
            PaymentStatus::Declined | PaymentStatus::Voided | PaymentStatus::Error => {
                self.fail_all(payment_id).await
            }
            // Transitions are always terminal; a pending target never
            // reaches this point.
            PaymentStatus::Pending => Ok(()),
        }
    }

    /// Activates every subscription riding on the payment with a freshly
    /// computed period. The provisional checkout period is discarded so the
    /// paid period starts at confirmation time, not cart time.
    async fn activate_all(&self, payment_id: Uuid) -> UseCaseResult<()> {
        let batch = self
            .subscription_repo
            .list_by_payment_id(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to list subscriptions");
                PaymentError::Internal(err)
            })?;

        if batch.is_empty() {
            warn!(%payment_id, "payments: settled payment has no subscriptions to activate");
            return Ok(());
        }

        let mut plan_ids: Vec<Uuid> = batch.iter().map(|s| s.plan_id).collect();
        plan_ids.sort_unstable();
        plan_ids.dedup();

        let plans = self.plan_repo.find_by_ids(plan_ids).await.map_err(|err| {
            error!(%payment_id, db_error = ?err, "payments: failed to resolve plans");
            PaymentError::Internal(err)
        })?;
        let plans_by_id: HashMap<Uuid, _> =
            plans.into_iter().map(|plan| (plan.id, plan)).collect();

        let now = Utc::now();
        for subscription in &batch {
            let plan = plans_by_id.get(&subscription.plan_id).ok_or_else(|| {
                PaymentError::Internal(anyhow!(
                    "plan {} missing for subscription {}",
                    subscription.plan_id,
                    subscription.id
                ))
            })?;
            let ends_at = plan
                .interval()
                .period_end_from(now)
                .context("failed to compute activation period end")?;

            self.subscription_repo
                .activate(subscription.id, now, ends_at)
                .await
                .map_err(|err| {
                    error!(
                        %payment_id,
                        subscription_id = %subscription.id,
                        db_error = ?err,
                        "payments: failed to activate subscription"
                    );
                    PaymentError::Internal(err)
                })?;
        }

        info!(
            %payment_id,
            activated = batch.len(),
            "payments: subscriptions activated"
        );

        Ok(())
    }

    async fn fail_all(&self, payment_id: Uuid) -> UseCaseResult<()> {
        let marked = self
            .subscription_repo
            .mark_past_due_by_payment_id(payment_id)
            .await
            .map_err(|err| {
                error!(
                    %payment_id,
                    db_error = ?err,
                    "payments: failed to mark subscriptions past_due"
                );
                PaymentError::Internal(err)
            })?;

        info!(%payment_id, marked, "payments: subscriptions marked past_due");

        Ok(())
    }
}
