// src/domain/listing.rs

use serde::{Deserialize, Serialize};

/// Rental pricing as entered by the owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSchedule {
    pub minimum_days: i64,
    pub daily_rate: f64,
    pub weekly_rate: f64,
}

impl PricingSchedule {
    /// Price for a rental of `days` days: whole weeks at the weekly rate
    /// (when one is set), remaining days at the daily rate.
    pub fn quote(&self, days: i64) -> f64 {
        if self.weekly_rate > 0.0 {
            let weeks = days / 7;
            let rest = days % 7;
            weeks as f64 * self.weekly_rate + rest as f64 * self.daily_rate
        } else {
            days as f64 * self.daily_rate
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub owner_id: i64,
    pub bag_id: Option<i64>,
    pub location: String,
    pub description: String,
    pub pricing_schedule: PricingSchedule,
    pub delivery_options: String,
    pub available: bool,
    pub featured: bool,
    /// Derived from the review set; 0 when the listing has no reviews.
    pub rating: f64,
    pub review_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
