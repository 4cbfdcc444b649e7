use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            payments::PaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::payments::OverridePaymentModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payments::PaymentPostgres, plans::PlanPostgres, subscriptions::SubscriptionPostgres,
        },
    },
    payments::gateway::PayGateClient,
};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::axum_http::error_responses::into_error_response;
use crate::usecases::payments::{PayGateway, PaymentUseCase};

/// Header the gateway uses to deliver the event checksum.
const CHECKSUM_HEADER: &str = "x-paygate-checksum";

pub fn routes(db_pool: Arc<PgPoolSquad>, gateway: Arc<PayGateClient>) -> Router {
    let payment_repo = PaymentPostgres::new(Arc::clone(&db_pool));
    let subscription_repo = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_repo = PlanPostgres::new(Arc::clone(&db_pool));
    let payment_usecase = PaymentUseCase::new(
        Arc::new(payment_repo),
        Arc::new(subscription_repo),
        Arc::new(plan_repo),
        gateway,
    );

    Router::new()
        .route("/webhook", post(gateway_webhook))
        .route("/:payment_id", get(get_payment))
        .route("/:payment_id/override", post(override_payment))
        .with_state(Arc::new(payment_usecase))
}

/// No bearer auth here: authenticity comes from the checksum the gateway
/// computes with the shared secret.
pub async fn gateway_webhook<Pay, S, P, Gate>(
    State(payment_usecase): State<Arc<PaymentUseCase<Pay, S, P, Gate>>>,
    headers: HeaderMap,
    Json(event): Json<serde_json::Value>,
) -> Response
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Gate: PayGateway + Send + Sync + 'static,
{
    let checksum = headers
        .get(CHECKSUM_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match payment_usecase.process_gateway_event(event, checksum).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "received": true })),
        )
            .into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}

pub async fn get_payment<Pay, S, P, Gate>(
    State(payment_usecase): State<Arc<PaymentUseCase<Pay, S, P, Gate>>>,
    auth: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Response
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Gate: PayGateway + Send + Sync + 'static,
{
    match payment_usecase
        .get_payment(payment_id, auth.user_id, auth.is_admin())
        .await
    {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}

pub async fn override_payment<Pay, S, P, Gate>(
    State(payment_usecase): State<Arc<PaymentUseCase<Pay, S, P, Gate>>>,
    admin: AdminUser,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<OverridePaymentModel>,
) -> Response
where
    Pay: PaymentRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Gate: PayGateway + Send + Sync + 'static,
{
    match payment_usecase
        .override_status(
            payment_id,
            &request.status,
            request.reason,
            admin.0.user_id,
        )
        .await
    {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}
