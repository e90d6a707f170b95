// src/domain/booking.rs

use crate::errors::ServerError;
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Convert an epoch-millisecond timestamp to its UTC epoch-day ordinal.
pub fn epoch_day_from_millis(millis: i64) -> i64 {
    millis.div_euclid(MILLIS_PER_DAY)
}

/// Midnight UTC of the given epoch day, in epoch milliseconds.
pub fn millis_from_epoch_day(day: i64) -> i64 {
    day * MILLIS_PER_DAY
}

/// Inclusive day range of a rental. Both endpoints are epoch-day ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start_day: i64,
    pub end_day: i64,
}

impl DateRange {
    pub fn new(start_day: i64, end_day: i64) -> Result<Self, ServerError> {
        if start_day > end_day {
            return Err(ServerError::BadRequest(
                "startDate must not be after endDate".into(),
            ));
        }
        Ok(Self { start_day, end_day })
    }

    /// Build a range from the wire format (epoch-millisecond integers).
    pub fn from_millis(start_millis: i64, end_millis: i64) -> Result<Self, ServerError> {
        Self::new(
            epoch_day_from_millis(start_millis),
            epoch_day_from_millis(end_millis),
        )
    }

    /// Number of rental days, endpoints inclusive.
    pub fn days(&self) -> i64 {
        self.end_day - self.start_day + 1
    }

    /// Closed intervals intersect iff each one's start is <= the other's
    /// end. A booking ending on another's start day counts as an overlap:
    /// there is no same-day turnover.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start_day <= other.end_day && other.start_day <= self.end_day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(ServerError::InvalidTransition(format!(
                "Unknown booking status '{other}'"
            ))),
        }
    }

    /// Cancelled and completed are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

/// A booking row as stored. Dates are epoch-day ordinals; `BookingView`
/// carries the wire shape.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: i64,
    pub listing_id: i64,
    pub user_id: i64,
    pub range: DateRange,
    pub status: BookingStatus,
    pub total_price: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Wire representation: dates as epoch milliseconds, camelCase keys.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: i64,
    pub listing_id: i64,
    pub user_id: i64,
    pub start_date: i64,
    pub end_date: i64,
    pub status: &'static str,
    pub total_price: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        BookingView {
            id: b.id,
            listing_id: b.listing_id,
            user_id: b.user_id,
            start_date: millis_from_epoch_day(b.range.start_day),
            end_date: millis_from_epoch_day(b.range.end_day),
            status: b.status.as_str(),
            total_price: b.total_price,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub listing_id: i64,
    pub start_date: i64,
    pub end_date: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
