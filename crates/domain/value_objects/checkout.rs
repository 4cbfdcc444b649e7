use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::entity_types::EntityType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemModel {
    pub plan_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub entity_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestModel {
    pub items: Vec<CheckoutItemModel>,
}

/// Per-item breakdown echoed back so the widget can render the cart.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineModel {
    pub entity_name: String,
    pub plan_name: String,
    pub price_in_cents: i32,
    pub price: String,
}

/// Everything the client needs to hand off to the gateway widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionModel {
    pub payment_id: Uuid,
    pub reference: String,
    pub amount_in_cents: i32,
    pub amount: String,
    pub currency: String,
    pub public_key: String,
    pub signature: String,
    pub redirect_url: String,
    pub items: Vec<CheckoutLineModel>,
}

/// Renders minor units as a decimal string. Amounts never touch floats so
/// the checkout total always matches the externally reported amount.
pub fn format_minor(amount_minor: i32) -> String {
    format!("{}.{:02}", amount_minor / 100, amount_minor % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_minor(999), "9.99");
        assert_eq!(format_minor(100), "1.00");
        assert_eq!(format_minor(5), "0.05");
        assert_eq!(format_minor(120050), "1200.50");
    }
}
