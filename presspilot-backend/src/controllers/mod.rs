pub mod health;
pub mod tools;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::AppState;

/// Check the bearer admin token on a request. Returns the error
/// response to send when the check fails.
pub(crate) fn require_admin(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(), HttpResponse> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").trim().to_string());

    match token {
        Some(t) if t == state.config.admin_token => Ok(()),
        Some(_) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid authorization token"
        }))),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "No authorization token provided"
        }))),
    }
}
