use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
};

/// Guards the internal endpoints with `Authorization: Bearer <ADMIN_TOKEN>`
///
/// With no token configured every request is refused.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let authorized = match (state.admin_token.as_deref(), presented) {
        (Some(expected), Some(token)) => constant_time_eq(expected, token),
        _ => false,
    };

    if !authorized {
        tracing::warn!(uri = %request.uri(), "Rejected internal request");
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
