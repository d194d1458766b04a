use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, repository, AppState};

// One message for every rejection path so clients cannot probe which
// check failed.
const CREDENTIALS_MSG: &str = "Could not validate credentials";

/// Resolves the request's bearer token into an authenticated `User` and
/// stores it in the request extensions. Handlers behind this layer take
/// `Extension<User>` as the sole source of the owner id.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized(CREDENTIALS_MSG))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized(CREDENTIALS_MSG))?;

    let subject = state.keys.validate(token).map_err(|e| {
        tracing::warn!("Token rejected: {:?}", e);
        AppError::Unauthorized(CREDENTIALS_MSG)
    })?;

    // The subject may have been deleted after the token was issued;
    // still a 401, never a 404.
    let user = repository::users::find_by_email(&state.db, &subject)
        .await?
        .ok_or(AppError::Unauthorized(CREDENTIALS_MSG))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
