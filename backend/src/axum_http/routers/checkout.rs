use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            payments::PaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::checkout::CheckoutRequestModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payments::PaymentPostgres, plans::PlanPostgres, subscriptions::SubscriptionPostgres,
        },
    },
    payments::gateway::PayGateClient,
};

use crate::auth::AuthUser;
use crate::axum_http::error_responses::into_error_response;
use crate::usecases::checkout::CheckoutUseCase;

pub fn routes(db_pool: Arc<PgPoolSquad>, gateway: Arc<PayGateClient>) -> Router {
    let plan_repo = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repo = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let payment_repo = PaymentPostgres::new(Arc::clone(&db_pool));
    let checkout_usecase = CheckoutUseCase::new(
        Arc::new(plan_repo),
        Arc::new(subscription_repo),
        Arc::new(payment_repo),
        gateway,
    );

    Router::new()
        .route("/", post(create_checkout))
        .with_state(Arc::new(checkout_usecase))
}

pub async fn create_checkout<P, S, Pay>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<P, S, Pay>>>,
    auth: AuthUser,
    Json(request): Json<CheckoutRequestModel>,
) -> Response
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    match checkout_usecase
        .create_checkout(auth.user_id, request.items)
        .await
    {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}
