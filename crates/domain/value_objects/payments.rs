use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::{checkout::format_minor, enums::payment_statuses::PaymentStatus},
};

/// Gateway webhook envelope. The `signature.properties` list names the
/// dotted paths that were folded into the checksum, in order.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEventModel {
    pub event: String,
    pub timestamp: Value,
    pub signature: GatewaySignatureModel,
    pub data: GatewayEventDataModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySignatureModel {
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEventDataModel {
    pub transaction: GatewayTransactionModel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransactionModel {
    pub id: Option<String>,
    pub reference: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub message: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverridePaymentModel {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reference: String,
    pub amount_in_cents: i32,
    pub amount: String,
    pub currency: String,
    pub status: PaymentStatus,
    pub provider_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub failure_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// The gateway's live view, attached only while the local row is still
    /// pending and the lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_status: Option<String>,
}

impl From<PaymentEntity> for PaymentModel {
    fn from(entity: PaymentEntity) -> Self {
        let status = PaymentStatus::from_str(&entity.status).unwrap_or(PaymentStatus::Error);
        Self {
            id: entity.id,
            user_id: entity.user_id,
            reference: entity.reference,
            amount_in_cents: entity.amount_minor,
            amount: format_minor(entity.amount_minor),
            currency: entity.currency,
            status,
            provider_transaction_id: entity.provider_transaction_id,
            payment_method: entity.payment_method,
            failure_reason: entity.failure_reason,
            paid_at: entity.paid_at,
            created_at: entity.created_at,
            gateway_status: None,
        }
    }
}
