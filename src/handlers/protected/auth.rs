use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::Profile;
use crate::state::AppState;

/// GET /api/auth/me - profile of the token holder
pub async fn me_get(State(state): State<AppState>, caller: Caller) -> ApiResult<Profile> {
    let profile = state.accounts.me(caller.user_id()).await?;
    Ok(ApiResponse::success(profile))
}
