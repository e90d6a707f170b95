use astra::Response;
// errors.rs
use std::fmt;

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB).
///
/// Every variant is a per-request failure; nothing here is fatal to the
/// process. `responses::errors` maps each variant to a JSON body and a
/// status code.
#[derive(Debug)]
pub enum ServerError {
    NotFound(String),
    BadRequest(String),
    /// No valid session where one is required.
    Unauthorized,
    /// Valid session, but the caller is neither the resource owner nor admin.
    Forbidden(String),
    /// Requested date range overlaps a confirmed booking.
    AvailabilityConflict,
    /// Reviewer already reviewed this listing.
    DuplicateReview,
    /// Status change out of a terminal state, or to an unrecognized state.
    InvalidTransition(String),
    DbError(String),
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound(what) => write!(f, "{what} not found"),
            ServerError::BadRequest(msg) => write!(f, "{msg}"),
            ServerError::Unauthorized => write!(f, "Authentication required"),
            ServerError::Forbidden(msg) => write!(f, "{msg}"),
            ServerError::AvailabilityConflict => {
                write!(f, "Listing is not available for these dates")
            }
            ServerError::DuplicateReview => {
                write!(f, "You have already reviewed this listing")
            }
            ServerError::InvalidTransition(msg) => write!(f, "{msg}"),
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}
