use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into the JSON error shape clients expect:
/// `{"error": message}` with the matching status code.
pub fn error_to_response(err: ServerError) -> Response {
    let status = match &err {
        ServerError::NotFound(_) => 404,
        ServerError::BadRequest(_)
        | ServerError::AvailabilityConflict
        | ServerError::DuplicateReview
        | ServerError::InvalidTransition(_) => 400,
        ServerError::Unauthorized => 401,
        ServerError::Forbidden(_) => 403,
        ServerError::DbError(_) | ServerError::InternalError => 500,
    };

    json_error_response(status, &err.to_string())
}

pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .unwrap()
}
