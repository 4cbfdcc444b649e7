use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::subscriptions::SubscriptionRepository,
        value_objects::enums::entity_types::EntityType,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::axum_http::error_responses::into_error_response;
use crate::usecases::subscriptions::{CancelActor, SubscriptionUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repo = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscription_usecase = SubscriptionUseCase::new(Arc::new(subscription_repo));

    Router::new()
        .route("/status/:entity_type/:entity_id", get(entity_status))
        .route("/:subscription_id/cancel", post(cancel_subscription))
        .route(
            "/admin/:subscription_id/cancel",
            post(cancel_subscription_admin),
        )
        .with_state(Arc::new(subscription_usecase))
}

pub async fn entity_status<S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S>>>,
    _auth: AuthUser,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let Some(entity_type) = EntityType::from_str(&entity_type) else {
        return into_error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown entity type: {entity_type}"),
        );
    };

    match subscription_usecase
        .entity_status(entity_type, &entity_id)
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}

pub async fn cancel_subscription<S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S>>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase
        .cancel(subscription_id, CancelActor::User(auth.user_id))
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}

pub async fn cancel_subscription_admin<S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S>>>,
    admin: AdminUser,
    Path(subscription_id): Path<Uuid>,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase
        .cancel(subscription_id, CancelActor::Admin(admin.0.user_id))
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => into_error_response(err.status_code(), err.to_string()),
    }
}
