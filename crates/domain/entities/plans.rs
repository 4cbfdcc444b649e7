use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::billing_intervals::BillingInterval,
    infra::db::postgres::schema::plans,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub currency: String,
    pub billing_interval: String,
    pub is_active: bool,
}

impl PlanEntity {
    /// Rows written before the interval column was constrained default to
    /// monthly rather than failing the read.
    pub fn interval(&self) -> BillingInterval {
        BillingInterval::from_str(&self.billing_interval).unwrap_or(BillingInterval::Monthly)
    }
}
