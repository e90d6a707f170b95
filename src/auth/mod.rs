pub mod sessions;

pub use sessions::{create_session, load_user_from_session, AuthUser};

use crate::db::connection::Database;
use crate::errors::ServerError;
use astra::Request;
use chrono::Utc;

/// Resolves the acting user from the request's bearer token or session
/// cookie. Fails with `Unauthorized` when no valid session is presented.
pub fn current_user(req: &Request, db: &Database) -> Result<AuthUser, ServerError> {
    let token = bearer_token(req)
        .or_else(|| session_cookie(req))
        .ok_or(ServerError::Unauthorized)?;

    let now = Utc::now().timestamp();

    db.with_conn(|conn| load_user_from_session(conn, &token, now))?
        .ok_or(ServerError::Unauthorized)
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get("Authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

fn session_cookie(req: &Request) -> Option<String> {
    let cookies = req.headers().get("Cookie")?.to_str().ok()?;

    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if let (Some("session"), Some(v)) = (parts.next(), parts.next()) {
            return Some(v.to_string());
        }
    }
    None
}
