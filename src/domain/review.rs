// src/domain/review.rs

use crate::errors::ServerError;
use serde::{Deserialize, Serialize};

/// A review as returned by the list endpoint: joined with the
/// reviewer's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithUser {
    pub id: i64,
    pub listing_id: i64,
    pub reviewer_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: i64,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    pub listing_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

pub fn validate_rating(rating: i64) -> Result<(), ServerError> {
    if !(1..=5).contains(&rating) {
        return Err(ServerError::BadRequest(
            "Rating must be an integer between 1 and 5".into(),
        ));
    }
    Ok(())
}
