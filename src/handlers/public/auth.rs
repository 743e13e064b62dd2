use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, Profile, RegisterRequest, Session};
use crate::state::AppState;

/// POST /api/auth/register - create an account
///
/// Expected Input:
/// ```json
/// { "email": "string", "password": "string", "displayName": "string (optional)" }
/// ```
///
/// 400 when email or password is missing, 409 when the email is taken.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Profile> {
    let Json(request) = payload?;
    let profile = state.accounts.register(request).await?;
    Ok(ApiResponse::created(profile))
}

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "string", "password": "string" }
/// ```
/// `username` is accepted in place of `email`.
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "jwt-token-7-1717000000000",
///     "user": { "id": 7, "email": "a@b.c", "displayName": "A", "role": "USER" }
///   }
/// }
/// ```
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = payload?;
    let session = state.accounts.login(request).await?;
    Ok(ApiResponse::success(session))
}
