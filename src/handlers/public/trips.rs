use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};

use crate::api::format::{TripDetail, TripList};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ListQuery;
use crate::state::AppState;
use crate::types::TripId;

/// GET /api/trips - list or search trips
///
/// Query parameters (all optional):
/// - `query`: case-insensitive search over title, description, location,
///   province and tags. Paging is ignored when searching.
/// - `page`, `size`: zero-based page window, newest first. Without either,
///   every trip is returned.
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "trips": [ { "id": 3, "title": "...", "coverImage": "..." } ], "total": 1 } }
/// ```
pub async fn trips_get(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<TripList> {
    let Query(query) = query?;
    let listing = state.trips.list(&query).await?;
    Ok(ApiResponse::success(TripList::from(&listing)))
}

/// GET /api/trips/:id - full trip with author block
pub async fn trip_get(
    State(state): State<AppState>,
    id: Result<Path<TripId>, PathRejection>,
) -> ApiResult<TripDetail> {
    let Path(id) = id?;
    let view = state.trips.get(id).await?;
    Ok(ApiResponse::success(TripDetail::from(&view)))
}
