use crate::auth::AuthUser;
use crate::db::connection::Database;
use crate::db::listings::get_listing;
use crate::domain::booking::{Booking, BookingStatus, CreateBookingRequest, DateRange};
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const BOOKING_COLUMNS: &str =
    "id, listing_id, user_id, start_day, end_day, status, total_price, created_at, updated_at";

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    let status: String = row.get(5)?;
    let status = BookingStatus::parse(&status).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unrecognized booking status '{status}'").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        listing_id: row.get(1)?,
        user_id: row.get(2)?,
        range: DateRange {
            start_day: row.get(3)?,
            end_day: row.get(4)?,
        },
        status,
        total_price: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn get_booking(conn: &Connection, id: i64) -> Result<Option<Booking>, ServerError> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"),
        params![id],
        booking_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Count confirmed bookings for `listing_id` whose inclusive day range
/// intersects `range`. Only confirmed bookings block the calendar; pending
/// ones never do. `exclude` skips the booking currently being confirmed.
fn count_overlapping(
    conn: &Connection,
    listing_id: i64,
    range: &DateRange,
    exclude: Option<i64>,
) -> Result<i64, ServerError> {
    conn.query_row(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE listing_id = ?1
          AND status = 'confirmed'
          AND start_day <= ?2
          AND ?3 <= end_day
          AND (?4 IS NULL OR id <> ?4)
        "#,
        params![listing_id, range.end_day, range.start_day, exclude],
        |row| row.get(0),
    )
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// True iff no confirmed booking blocks `range` on the listing's calendar.
/// Answers the calendar question only; the owner's `available` flag is a
/// separate check (see `create_booking`).
pub fn check_availability(
    db: &Database,
    listing_id: i64,
    range: &DateRange,
) -> Result<bool, ServerError> {
    db.with_conn(|conn| Ok(count_overlapping(conn, listing_id, range, None)? == 0))
}

/// Creates a booking in `pending` status. The overlap check and the insert
/// run inside one IMMEDIATE transaction, so a concurrent request on the
/// same listing cannot slip between the check and the write.
pub fn create_booking(
    db: &Database,
    user: &AuthUser,
    req: &CreateBookingRequest,
) -> Result<Booking, ServerError> {
    let range = DateRange::from_millis(req.start_date, req.end_date)?;
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let listing = get_listing(&tx, req.listing_id)?
            .ok_or_else(|| ServerError::NotFound("Listing".into()))?;

        // Owner pause flag is consulted in addition to the calendar.
        if !listing.available {
            return Err(ServerError::BadRequest(
                "Listing is not accepting bookings".into(),
            ));
        }

        let schedule = &listing.pricing_schedule;
        if range.days() < schedule.minimum_days {
            return Err(ServerError::BadRequest(format!(
                "Minimum rental is {} days",
                schedule.minimum_days
            )));
        }

        if count_overlapping(&tx, listing.id, &range, None)? > 0 {
            return Err(ServerError::AvailabilityConflict);
        }

        let total_price = schedule.quote(range.days());

        tx.execute(
            r#"
            INSERT INTO bookings (listing_id, user_id, start_day, end_day, status, total_price, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)
            "#,
            params![listing.id, user.id, range.start_day, range.end_day, total_price, now],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(Booking {
            id,
            listing_id: listing.id,
            user_id: user.id,
            range,
            status: BookingStatus::Pending,
            total_price,
            created_at: now,
            updated_at: now,
        })
    })
}

/// Applies a status transition. Confirming re-runs the overlap check
/// (excluding the booking itself) inside the same IMMEDIATE transaction as
/// the write, so a booking confirmed concurrently for an overlapping range
/// cannot be missed.
pub fn update_status(
    db: &Database,
    user: &AuthUser,
    booking_id: i64,
    new_status: BookingStatus,
) -> Result<Booking, ServerError> {
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut booking = get_booking(&tx, booking_id)?
            .ok_or_else(|| ServerError::NotFound("Booking".into()))?;

        let listing = get_listing(&tx, booking.listing_id)?
            .ok_or_else(|| ServerError::NotFound("Listing".into()))?;

        let is_renter = user.id == booking.user_id;
        let is_owner = user.id == listing.owner_id;
        if !is_renter && !is_owner && !user.is_admin() {
            return Err(ServerError::Forbidden(
                "Only the renter, the listing owner, or an admin may change this booking".into(),
            ));
        }

        if !booking.status.can_transition_to(new_status) {
            return Err(ServerError::InvalidTransition(format!(
                "Cannot change a {} booking to {}",
                booking.status.as_str(),
                new_status.as_str()
            )));
        }

        if new_status == BookingStatus::Confirmed
            && count_overlapping(&tx, booking.listing_id, &booking.range, Some(booking.id))? > 0
        {
            return Err(ServerError::AvailabilityConflict);
        }

        tx.execute(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?",
            params![new_status.as_str(), now, booking_id],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

        tx.commit()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        booking.status = new_status;
        booking.updated_at = now;
        Ok(booking)
    })
}

/// Hard delete. Deleting an absent booking is a no-op success so retries
/// stay simple; an existing booking may only be removed by its renter or
/// an admin.
pub fn delete_booking(db: &Database, user: &AuthUser, booking_id: i64) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        let Some(booking) = get_booking(conn, booking_id)? else {
            return Ok(());
        };

        if user.id != booking.user_id && !user.is_admin() {
            return Err(ServerError::Forbidden(
                "Only the renter or an admin may delete this booking".into(),
            ));
        }

        conn.execute("DELETE FROM bookings WHERE id = ?", params![booking_id])
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Booking>, ServerError> {
    db.with_conn(|conn| get_booking(conn, id))
}

pub fn list_by_listing(db: &Database, listing_id: i64) -> Result<Vec<Booking>, ServerError> {
    query_bookings(
        db,
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE listing_id = ? ORDER BY start_day"),
        listing_id,
    )
}

pub fn list_by_user(db: &Database, user_id: i64) -> Result<Vec<Booking>, ServerError> {
    query_bookings(
        db,
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? ORDER BY created_at DESC"),
        user_id,
    )
}

fn query_bookings(db: &Database, sql: &str, arg: i64) -> Result<Vec<Booking>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params![arg], booking_from_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
