use crate::auth::AuthUser;
use crate::db::connection::Database;
use crate::db::listings::{get_listing, recompute_rating};
use crate::domain::review::{validate_rating, AddReviewRequest, ReviewWithUser};
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

struct ReviewRow {
    id: i64,
    listing_id: i64,
    reviewer_id: i64,
}

fn get_review(conn: &Connection, id: i64) -> Result<Option<ReviewRow>, ServerError> {
    conn.query_row(
        "SELECT id, listing_id, reviewer_id FROM reviews WHERE id = ?",
        params![id],
        |row| {
            Ok(ReviewRow {
                id: row.get(0)?,
                listing_id: row.get(1)?,
                reviewer_id: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Persists a review and recomputes the listing's aggregates in the same
/// transaction; a reader never sees the review without the updated rating.
/// One review per (listing, reviewer): checked up front and backstopped by
/// the UNIQUE constraint, which a lost race surfaces as `DuplicateReview`.
pub fn add_review(
    db: &Database,
    reviewer: &AuthUser,
    req: &AddReviewRequest,
) -> Result<i64, ServerError> {
    validate_rating(req.rating)?;
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        get_listing(&tx, req.listing_id)?
            .ok_or_else(|| ServerError::NotFound("Listing".into()))?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM reviews WHERE listing_id = ? AND reviewer_id = ?",
                params![req.listing_id, reviewer.id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        if existing.is_some() {
            return Err(ServerError::DuplicateReview);
        }

        tx.execute(
            r#"
            INSERT INTO reviews (listing_id, reviewer_id, rating, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![req.listing_id, reviewer.id, req.rating, req.comment, now],
        )
        .map_err(translate_insert_error)?;

        let id = tx.last_insert_rowid();

        recompute_rating(&tx, req.listing_id)?;

        tx.commit()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(id)
    })
}

fn translate_insert_error(e: rusqlite::Error) -> ServerError {
    match e {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation =>
        {
            ServerError::DuplicateReview
        }
        other => ServerError::DbError(other.to_string()),
    }
}

/// Deletes a review and recomputes the listing's aggregates in the same
/// transaction. Only the reviewer or an admin may delete.
pub fn delete_review(db: &Database, user: &AuthUser, review_id: i64) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let review = get_review(&tx, review_id)?
            .ok_or_else(|| ServerError::NotFound("Review".into()))?;

        if user.id != review.reviewer_id && !user.is_admin() {
            return Err(ServerError::Forbidden(
                "Only the reviewer or an admin may delete this review".into(),
            ));
        }

        tx.execute("DELETE FROM reviews WHERE id = ?", params![review.id])
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        recompute_rating(&tx, review.listing_id)?;

        tx.commit()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(())
    })
}

pub fn list_by_listing(
    db: &Database,
    listing_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReviewWithUser>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT r.id, r.listing_id, r.reviewer_id, r.rating, r.comment, r.created_at,
                       u.name
                FROM reviews r
                JOIN users u ON u.id = r.reviewer_id
                WHERE r.listing_id = ?
                ORDER BY r.created_at DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params![listing_id, limit, offset], |row| {
                Ok(ReviewWithUser {
                    id: row.get(0)?,
                    listing_id: row.get(1)?,
                    reviewer_id: row.get(2)?,
                    rating: row.get(3)?,
                    comment: row.get(4)?,
                    created_at: row.get(5)?,
                    user_name: row.get(6)?,
                })
            })
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
