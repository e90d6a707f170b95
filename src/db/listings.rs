use crate::db::connection::Database;
use crate::domain::listing::{Listing, PricingSchedule};
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const LISTING_COLUMNS: &str = "id, owner_id, bag_id, location, description, \
     minimum_days, daily_rate, weekly_rate, delivery_options, \
     available, featured, rating, review_count, created_at, updated_at";

fn listing_from_row(row: &Row) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        bag_id: row.get(2)?,
        location: row.get(3)?,
        description: row.get(4)?,
        pricing_schedule: PricingSchedule {
            minimum_days: row.get(5)?,
            daily_rate: row.get(6)?,
            weekly_rate: row.get(7)?,
        },
        delivery_options: row.get(8)?,
        available: row.get::<_, i64>(9)? != 0,
        featured: row.get::<_, i64>(10)? != 0,
        rating: row.get(11)?,
        review_count: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// Connection-level lookup so booking/review transactions can read a
/// listing without leaving their transaction.
pub fn get_listing(conn: &Connection, id: i64) -> Result<Option<Listing>, ServerError> {
    conn.query_row(
        &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?"),
        params![id],
        listing_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Listing>, ServerError> {
    db.with_conn(|conn| get_listing(conn, id))
}

pub fn list_all(db: &Database) -> Result<Vec<Listing>, ServerError> {
    query_listings(db, &format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC"), params![])
}

pub fn list_featured(db: &Database, limit: i64) -> Result<Vec<Listing>, ServerError> {
    query_listings(
        db,
        &format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE featured = 1 AND available = 1 \
             ORDER BY rating DESC, review_count DESC LIMIT ?"
        ),
        params![limit],
    )
}

pub fn search_by_location(db: &Database, location: &str) -> Result<Vec<Listing>, ServerError> {
    let term = format!("%{location}%");
    query_listings(
        db,
        &format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE location LIKE ? ORDER BY rating DESC"
        ),
        params![term],
    )
}

fn query_listings(
    db: &Database,
    sql: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<Listing>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(args, listing_from_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

/// Fields an owner supplies when creating a listing. Aggregates start at
/// zero; they only ever change through `recompute_rating`.
pub struct NewListing {
    pub owner_id: i64,
    pub bag_id: Option<i64>,
    pub location: String,
    pub description: String,
    pub pricing_schedule: PricingSchedule,
    pub delivery_options: String,
    pub featured: bool,
}

pub fn insert_listing(db: &Database, listing: &NewListing) -> Result<i64, ServerError> {
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO listings (
                owner_id, bag_id, location, description,
                minimum_days, daily_rate, weekly_rate, delivery_options,
                available, featured, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?10)
            "#,
            params![
                listing.owner_id,
                listing.bag_id,
                listing.location,
                listing.description,
                listing.pricing_schedule.minimum_days,
                listing.pricing_schedule.daily_rate,
                listing.pricing_schedule.weekly_rate,
                listing.delivery_options,
                listing.featured as i64,
                now,
            ],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    })
}

/// Owner pause/unpause toggle. Independent of the booking calendar.
pub fn set_availability(db: &Database, id: i64, available: bool) -> Result<(), ServerError> {
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        let changed = conn
            .execute(
                "UPDATE listings SET available = ?, updated_at = ? WHERE id = ?",
                params![available as i64, now, id],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        if changed == 0 {
            return Err(ServerError::NotFound("Listing".into()));
        }
        Ok(())
    })
}

/// Rewrites a listing's `rating` and `review_count` from the reviews table.
/// One statement, idempotent, safe to re-run; an empty review set resets
/// the rating to 0 rather than leaving it stale.
pub fn recompute_rating(conn: &Connection, listing_id: i64) -> Result<(), ServerError> {
    conn.execute(
        r#"
        UPDATE listings SET
            rating = (SELECT COALESCE(AVG(rating), 0) FROM reviews WHERE listing_id = ?1),
            review_count = (SELECT COUNT(*) FROM reviews WHERE listing_id = ?1),
            updated_at = ?2
        WHERE id = ?1
        "#,
        params![listing_id, Utc::now().timestamp_millis()],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(())
}
