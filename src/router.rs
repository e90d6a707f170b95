use crate::auth::current_user;
use crate::db::{bookings, listings, reviews, Database};
use crate::domain::booking::{
    BookingStatus, BookingView, CreateBookingRequest, DateRange, UpdateStatusRequest,
};
use crate::domain::review::AddReviewRequest;
use crate::errors::ServerError;
use crate::responses::{json_response, json_response_with_status, ResultResp};
use astra::Request;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;

pub fn handle(req: Request, db: &Database) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => json_response(&json!({ "status": "ok" })),

        // ----- Listings (read-only; create/update live with the identity-
        // bridged admin tooling, outside this server) -----
        ("GET", ["api", "listings"]) => json_response(&listings::list_all(db)?),

        ("GET", ["api", "listings", "featured"]) => {
            let params = parse_query(&req);
            let limit = params
                .get("limit")
                .and_then(|v| v.parse().ok())
                .unwrap_or(6);
            json_response(&listings::list_featured(db, limit)?)
        }

        ("GET", ["api", "listings", "search"]) => {
            let params = parse_query(&req);
            let location = params.get("location").map(String::as_str).unwrap_or("");
            json_response(&listings::search_by_location(db, location)?)
        }

        ("GET", ["api", "listings", id]) => {
            let listing = listings::find_by_id(db, parse_id(id)?)?
                .ok_or_else(|| ServerError::NotFound("Listing".into()))?;
            json_response(&listing)
        }

        // ----- Bookings -----
        ("GET", ["api", "bookings", "listing", id]) => {
            let found = bookings::list_by_listing(db, parse_id(id)?)?;
            json_response(&found.into_iter().map(BookingView::from).collect::<Vec<_>>())
        }

        ("GET", ["api", "bookings", "user", id]) => {
            let found = bookings::list_by_user(db, parse_id(id)?)?;
            json_response(&found.into_iter().map(BookingView::from).collect::<Vec<_>>())
        }

        ("GET", ["api", "bookings", "check-availability", id]) => {
            let listing_id = parse_id(id)?;
            let params = parse_query(&req);
            let start = required_i64(&params, "startDate")?;
            let end = required_i64(&params, "endDate")?;

            let range = DateRange::from_millis(start, end)?;
            let available = bookings::check_availability(db, listing_id, &range)?;
            json_response(&json!({ "available": available }))
        }

        ("GET", ["api", "bookings", id]) => {
            let booking = bookings::find_by_id(db, parse_id(id)?)?
                .ok_or_else(|| ServerError::NotFound("Booking".into()))?;
            json_response(&BookingView::from(booking))
        }

        ("POST", ["api", "bookings"]) => {
            let user = current_user(&req, db)?;
            let payload: CreateBookingRequest = read_json(req)?;

            let booking = bookings::create_booking(db, &user, &payload)?;
            json_response_with_status(201, &json!({ "id": booking.id }))
        }

        ("PATCH", ["api", "bookings", id, "status"]) => {
            let booking_id = parse_id(id)?;
            let user = current_user(&req, db)?;
            let payload: UpdateStatusRequest = read_json(req)?;

            let status = BookingStatus::parse(&payload.status)?;
            bookings::update_status(db, &user, booking_id, status)?;
            json_response(&json!({ "message": "Booking status updated successfully" }))
        }

        ("DELETE", ["api", "bookings", id]) => {
            let booking_id = parse_id(id)?;
            let user = current_user(&req, db)?;

            bookings::delete_booking(db, &user, booking_id)?;
            json_response(&json!({ "message": "Booking deleted successfully" }))
        }

        // ----- Reviews -----
        ("GET", ["api", "reviews", "listing", id]) => {
            let listing_id = parse_id(id)?;
            let params = parse_query(&req);
            let limit = params
                .get("limit")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10);
            let offset = params
                .get("offset")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);

            json_response(&reviews::list_by_listing(db, listing_id, limit, offset)?)
        }

        ("POST", ["api", "reviews"]) => {
            // Reviewer identity comes from the session, never the body.
            let user = current_user(&req, db)?;
            let payload: AddReviewRequest = read_json(req)?;

            let id = reviews::add_review(db, &user, &payload)?;
            json_response_with_status(201, &json!({ "id": id }))
        }

        ("DELETE", ["api", "reviews", id]) => {
            let review_id = parse_id(id)?;
            let user = current_user(&req, db)?;

            reviews::delete_review(db, &user, review_id)?;
            json_response(&json!({ "message": "Review deleted successfully" }))
        }

        _ => Err(ServerError::NotFound("Route".into())),
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid id '{raw}'")))
}

fn required_i64(params: &HashMap<String, String>, key: &str) -> Result<i64, ServerError> {
    params
        .get(key)
        .ok_or_else(|| ServerError::BadRequest(format!("Missing query parameter '{key}'")))?
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("'{key}' must be an epoch-millisecond integer")))
}

fn read_json<T: serde::de::DeserializeOwned>(req: Request) -> Result<T, ServerError> {
    let mut buf = String::new();
    req.into_body()
        .reader()
        .read_to_string(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("Failed to read request body: {e}")))?;

    serde_json::from_str(&buf)
        .map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn parse_query(req: &astra::Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }

    map
}
