use std::fmt::Display;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Yearly => "yearly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(BillingInterval::Monthly),
            "yearly" => Some(BillingInterval::Yearly),
            _ => None,
        }
    }

    /// Computes the end of a period starting at `starts_at` with calendar
    /// arithmetic (month lengths clamp, no fixed day counts).
    pub fn period_end_from(&self, starts_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = match self {
            BillingInterval::Monthly => Months::new(1),
            BillingInterval::Yearly => Months::new(12),
        };
        starts_at.checked_add_months(months)
    }
}

impl Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monthly_adds_one_calendar_month() {
        let starts_at = Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap();
        let ends_at = BillingInterval::Monthly.period_end_from(starts_at).unwrap();
        assert_eq!(ends_at, Utc.with_ymd_and_hms(2025, 4, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn monthly_clamps_to_shorter_months() {
        let starts_at = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let ends_at = BillingInterval::Monthly.period_end_from(starts_at).unwrap();
        assert_eq!(ends_at, Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn yearly_adds_one_calendar_year() {
        let starts_at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let ends_at = BillingInterval::Yearly.period_end_from(starts_at).unwrap();
        assert_eq!(ends_at, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
    }
}
