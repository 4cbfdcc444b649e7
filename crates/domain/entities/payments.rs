use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::payment_statuses::PaymentStatus,
    infra::db::postgres::schema::payments,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reference: String,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
    pub provider_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub failure_reason: Option<String>,
    pub provider_response: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub user_id: Uuid,
    pub reference: String,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
}

/// Field set persisted when a pending payment reaches its terminal status.
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    pub status: PaymentStatus,
    pub provider_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub failure_reason: Option<String>,
    pub provider_response: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Identifiers produced by the single checkout insert transaction.
#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub payment_id: Uuid,
    pub subscription_ids: Vec<Uuid>,
}
