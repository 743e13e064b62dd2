// handlers/protected/uploads.rs - multipart create/update with photo files
//
// Form fields: title, description, province, location, locationLink,
// latitude, longitude, tags (comma separated) and, for updates,
// existingPhotos (comma separated URLs to keep). Files arrive as `photos`.

use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use std::collections::HashMap;

use crate::api::format::TripDetail;
use crate::database::list_codec;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::{Coordinate, TripInput, TripPatch, Upload};
use crate::state::AppState;
use crate::types::TripId;

const PHOTO_FIELD: &str = "photos";
const DEFAULT_FILENAME: &str = "file.bin";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A parsed multipart body: text fields by name plus every `photos` file
#[derive(Debug, Default)]
struct TripForm {
    fields: HashMap<String, String>,
    files: Vec<Upload>,
}

impl TripForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = TripForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == PHOTO_FIELD {
                let filename = field.file_name().unwrap_or(DEFAULT_FILENAME).to_string();
                let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
                let bytes = field.bytes().await?.to_vec();
                form.files.push(Upload {
                    filename,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Present and not blank
    fn filled(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    fn coordinate(&self, name: &str) -> Option<Coordinate> {
        self.filled(name).map(Coordinate::Text)
    }

    /// Tags may be sent as `a,b` or in stored `{a,b}` form
    fn tags(&self) -> Option<Vec<String>> {
        self.fields.get("tags").map(|raw| split_list(&list_codec::decode(raw)))
    }

    fn existing_photos(&self) -> Vec<String> {
        self.fields
            .get("existingPhotos")
            .map(|raw| split_list(&list_codec::decode(raw)))
            .unwrap_or_default()
    }
}

fn split_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// POST /api/trips/upload - create a trip, uploading any `photos` files first
pub async fn upload_post(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> ApiResult<TripDetail> {
    let user_id = caller.require()?;
    let form = TripForm::read(multipart).await?;

    let input = TripInput {
        title: form.text("title"),
        description: form.text("description"),
        photos: None,
        tags: form.tags().filter(|tags| !tags.is_empty()),
        location: form.text("location"),
        province: form.filled("province"),
        location_link: form.text("locationLink"),
        latitude: form.coordinate("latitude"),
        longitude: form.coordinate("longitude"),
    };

    let view = state
        .trips
        .create_with_uploads(input, form.files, Some(user_id))
        .await?;
    Ok(ApiResponse::success(TripDetail::from(&view)))
}

/// PUT /api/trips/:id/upload - replace a trip's content from a form
///
/// Title, description, location and locationLink are always replaced.
/// Province and coordinates change only when a non-blank value is sent,
/// tags only when the field is present. Photos become `existingPhotos`
/// followed by the newly uploaded files.
pub async fn upload_put(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<TripId>, PathRejection>,
    multipart: Multipart,
) -> ApiResult<TripDetail> {
    let user_id = caller.require()?;
    let Path(id) = id?;
    let form = TripForm::read(multipart).await?;

    let patch = TripPatch {
        title: Some(form.text("title")),
        description: Some(form.text("description")),
        photos: None,
        tags: form.tags(),
        location: Some(form.text("location")),
        province: form.filled("province").map(Some),
        location_link: Some(form.text("locationLink")),
        latitude: form.coordinate("latitude").map(Some),
        longitude: form.coordinate("longitude").map(Some),
    };
    let existing = form.existing_photos();

    let view = state
        .trips
        .update_with_uploads(id, patch, existing, form.files, Some(user_id))
        .await?;
    Ok(ApiResponse::success(TripDetail::from(&view)))
}
