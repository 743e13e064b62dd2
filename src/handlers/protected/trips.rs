// handlers/protected/trips.rs - trip mutations and the caller's own listing

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;

use crate::api::format::{Deleted, OwnTripList, TripDetail, TripSummary};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::{TripInput, TripPatch};
use crate::state::AppState;
use crate::types::TripId;

/// GET /api/trips/mine - trips authored by the caller, newest first
pub async fn mine_get(State(state): State<AppState>, caller: Caller) -> ApiResult<OwnTripList> {
    let user_id = caller.require()?;
    let listing = state.trips.list_mine(Some(user_id)).await?;

    Ok(ApiResponse::success(OwnTripList {
        trips: listing.trips.iter().map(TripSummary::from).collect(),
        total: listing.total,
        user_id,
    }))
}

/// POST /api/trips - create a trip owned by the caller
///
/// Expected Input:
/// ```json
/// {
///   "title": "string (required)",
///   "description": "string",
///   "photos": ["url", "..."],
///   "tags": ["tag", "..."],
///   "location": "string",
///   "province": "string",
///   "locationLink": "string",
///   "latitude": 13.75,
///   "longitude": "100.5"
/// }
/// ```
pub async fn trip_post(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<TripInput>, JsonRejection>,
) -> ApiResult<TripDetail> {
    // An anonymous caller is told to log in even if the body is malformed.
    let user_id = caller.require()?;
    let Json(input) = payload?;

    let view = state.trips.create(input, Some(user_id)).await?;
    Ok(ApiResponse::success(TripDetail::from(&view)))
}

/// PUT /api/trips/:id - partial update; fields missing from the body are kept
pub async fn trip_put(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<TripId>, PathRejection>,
    payload: Result<Json<TripPatch>, JsonRejection>,
) -> ApiResult<TripDetail> {
    let user_id = caller.require()?;
    let Path(id) = id?;
    let Json(patch) = payload?;

    let view = state.trips.update(id, patch, Some(user_id)).await?;
    Ok(ApiResponse::success(TripDetail::from(&view)))
}

/// DELETE /api/trips/:id
pub async fn trip_delete(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<TripId>, PathRejection>,
) -> Result<ApiResponse<Deleted>, ApiError> {
    let user_id = caller.require()?;
    let Path(id) = id?;

    let id = state.trips.delete(id, Some(user_id)).await?;
    Ok(ApiResponse::success(Deleted { id, deleted: true }))
}
