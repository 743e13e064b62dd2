//! Trip listing operations.
//!
//! Every mutating call runs the same pipeline: resolve the caller, load the
//! trip (update/delete), ask the ownership gate, apply, persist. Reads are
//! public and never consult the gate.

use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::ServiceError;
use crate::auth::{authorize, Decision};
use crate::config::ApiConfig;
use crate::database::list_codec;
use crate::database::models::trip::{NewTripRecord, Ownership, Trip, TripRecord};
use crate::database::models::user::User;
use crate::database::{PageRequest, TripStore, UserStore};
use crate::storage::ObjectStore;
use crate::types::{Operation, TripId, UserId};

/// A latitude or longitude as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// Blank text means "no value".
    fn resolve(&self, field: &'static str) -> Result<Option<f64>, ServiceError> {
        match self {
            Coordinate::Number(value) => Ok(Some(*value)),
            Coordinate::Text(text) if text.trim().is_empty() => Ok(None),
            Coordinate::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ServiceError::validation(field, format!("{} must be a number", field))),
        }
    }
}

fn resolve_coordinate(
    value: Option<&Coordinate>,
    field: &'static str,
) -> Result<Option<f64>, ServiceError> {
    match value {
        Some(coordinate) => coordinate.resolve(field),
        None => Ok(None),
    }
}

/// Body of a create request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photos: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub location_link: Option<String>,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
}

/// Body of an update request. Absent fields are left alone; an explicit
/// `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    pub photos: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub province: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub location_link: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub latitude: Option<Option<Coordinate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub longitude: Option<Option<Coordinate>>,
}

/// `GET /api/trips` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// A file received with a multipart request
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

impl From<&User> for AuthorProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_label().to_string(),
            email: user.email.clone(),
        }
    }
}

/// A trip plus whatever is known about its author
#[derive(Debug, Clone, PartialEq)]
pub struct TripView {
    pub trip: Trip,
    pub author: Option<AuthorProfile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripListing {
    pub trips: Vec<TripView>,
    pub total: usize,
}

impl TripListing {
    fn new(trips: Vec<TripView>) -> Self {
        let total = trips.len();
        Self { trips, total }
    }
}

#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn TripStore>,
    users: Arc<dyn UserStore>,
    objects: Arc<dyn ObjectStore>,
    default_page_size: u32,
    max_page_size: u32,
}

impl TripService {
    pub fn new(
        trips: Arc<dyn TripStore>,
        users: Arc<dyn UserStore>,
        objects: Arc<dyn ObjectStore>,
        api: &ApiConfig,
    ) -> Self {
        Self {
            trips,
            users,
            objects,
            default_page_size: api.default_page_size.max(1),
            max_page_size: api.max_page_size.max(1),
        }
    }

    /// Newest first. A non-blank `query` searches and ignores paging;
    /// otherwise paging applies only when `page` or `size` is given.
    pub async fn list(&self, query: &ListQuery) -> Result<TripListing, ServiceError> {
        let search = query.query.as_deref().map(str::trim).filter(|q| !q.is_empty());

        let records = match search {
            Some(text) => self.trips.search(text).await?,
            None => self.trips.find_all(self.page_request(query)).await?,
        };

        Ok(TripListing::new(self.with_authors(records).await?))
    }

    fn page_request(&self, query: &ListQuery) -> Option<PageRequest> {
        if query.page.is_none() && query.size.is_none() {
            return None;
        }
        let size = query
            .size
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);

        Some(PageRequest {
            page: query.page.unwrap_or(0),
            size,
        })
    }

    pub async fn get(&self, id: TripId) -> Result<TripView, ServiceError> {
        let record = self
            .trips
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::trip_not_found(id))?;

        self.with_author(Trip::from(record)).await
    }

    pub async fn list_mine(&self, caller: Option<UserId>) -> Result<TripListing, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;
        let records = self.trips.find_by_author(caller).await?;
        Ok(TripListing::new(self.with_authors(records).await?))
    }

    pub async fn create(
        &self,
        input: TripInput,
        caller: Option<UserId>,
    ) -> Result<TripView, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;
        let record = new_record(input, caller)?;
        self.insert(record).await
    }

    /// Create with photos uploaded in the same request. Uploaded URLs are
    /// appended after any photos listed in `input`.
    pub async fn create_with_uploads(
        &self,
        input: TripInput,
        files: Vec<Upload>,
        caller: Option<UserId>,
    ) -> Result<TripView, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;
        let mut record = new_record(input, caller)?;

        let mut photos = list_codec::decode(&record.photos);
        photos.extend(self.upload_all(files).await?);
        record.photos = list_codec::encode(&photos);

        self.insert(record).await
    }

    pub async fn update(
        &self,
        id: TripId,
        patch: TripPatch,
        caller: Option<UserId>,
    ) -> Result<TripView, ServiceError> {
        let mut trip = self.load_for(Operation::Update, id, caller).await?;
        CheckedPatch::check(patch)?.apply(&mut trip);
        self.persist(trip).await
    }

    /// Update from a multipart form. The photo list becomes `existing_photos`
    /// followed by the URLs of `files`. Nothing is uploaded unless the caller
    /// may edit the trip and the patch is valid.
    pub async fn update_with_uploads(
        &self,
        id: TripId,
        patch: TripPatch,
        existing_photos: Vec<String>,
        files: Vec<Upload>,
        caller: Option<UserId>,
    ) -> Result<TripView, ServiceError> {
        let mut trip = self.load_for(Operation::Update, id, caller).await?;
        let mut checked = CheckedPatch::check(patch)?;

        let mut photos = existing_photos;
        photos.extend(self.upload_all(files).await?);
        checked.photos = Some(photos);

        checked.apply(&mut trip);
        self.persist(trip).await
    }

    pub async fn delete(&self, id: TripId, caller: Option<UserId>) -> Result<TripId, ServiceError> {
        let trip = self.load_for(Operation::Delete, id, caller).await?;
        self.trips.delete(&trip.to_record()).await?;
        tracing::info!("Trip {} deleted by user {:?}", id, caller);
        Ok(id)
    }

    /// Authenticate, load, then check ownership. The order decides which
    /// error a caller sees: 401 before 404 before 403.
    async fn load_for(
        &self,
        operation: Operation,
        id: TripId,
        caller: Option<UserId>,
    ) -> Result<Trip, ServiceError> {
        if caller.is_none() {
            return Err(ServiceError::Unauthenticated);
        }

        let record = self
            .trips
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::trip_not_found(id))?;
        let trip = Trip::from(record);

        let decision = authorize(operation, caller, trip.ownership);
        tracing::debug!(
            "{} trip {} by {:?} (owner {:?}): {:?}",
            operation,
            id,
            caller,
            trip.ownership,
            decision
        );

        match decision {
            Decision::Allow => Ok(trip),
            Decision::Deny => {
                tracing::warn!("User {:?} may not {} trip {}", caller, operation, id);
                Err(ServiceError::Forbidden)
            }
        }
    }

    async fn insert(&self, record: NewTripRecord) -> Result<TripView, ServiceError> {
        let saved = self.trips.insert(record).await?;
        tracing::info!("Trip {} created by user {:?}", saved.id, saved.author_id);
        self.with_author(Trip::from(saved)).await
    }

    async fn persist(&self, mut trip: Trip) -> Result<TripView, ServiceError> {
        trip.updated_at = Utc::now();
        let saved = self.trips.update(trip.to_record()).await?;
        tracing::info!("Trip {} updated", saved.id);
        self.with_author(Trip::from(saved)).await
    }

    async fn upload_all(&self, files: Vec<Upload>) -> Result<Vec<String>, ServiceError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            if file.bytes.is_empty() {
                continue;
            }
            let url = self
                .objects
                .put(file.bytes, &file.content_type, &file.filename)
                .await?;
            urls.push(url);
        }
        Ok(urls)
    }

    async fn with_author(&self, trip: Trip) -> Result<TripView, ServiceError> {
        let author = match trip.ownership {
            Ownership::Owned(owner) => self.users.find_by_id(owner).await?.as_ref().map(AuthorProfile::from),
            Ownership::Unowned => None,
        };
        Ok(TripView { trip, author })
    }

    async fn with_authors(&self, records: Vec<TripRecord>) -> Result<Vec<TripView>, ServiceError> {
        let mut authors: HashMap<UserId, Option<AuthorProfile>> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());

        for record in records {
            let trip = Trip::from(record);
            let author = match trip.ownership {
                Ownership::Owned(owner) => {
                    if !authors.contains_key(&owner) {
                        let profile = self.users.find_by_id(owner).await?.as_ref().map(AuthorProfile::from);
                        authors.insert(owner, profile);
                    }
                    authors.get(&owner).cloned().flatten()
                }
                Ownership::Unowned => None,
            };
            views.push(TripView { trip, author });
        }

        Ok(views)
    }
}

fn required_title(title: Option<String>) -> Result<String, ServiceError> {
    match title {
        Some(title) if !title.trim().is_empty() => Ok(title),
        _ => Err(ServiceError::validation("title", "Title is required")),
    }
}

fn new_record(input: TripInput, author: UserId) -> Result<NewTripRecord, ServiceError> {
    let title = required_title(input.title)?;
    let latitude = resolve_coordinate(input.latitude.as_ref(), "latitude")?;
    let longitude = resolve_coordinate(input.longitude.as_ref(), "longitude")?;

    Ok(NewTripRecord {
        title,
        description: input.description,
        photos: list_codec::encode(&input.photos.unwrap_or_default()),
        tags: list_codec::encode(&input.tags.unwrap_or_default()),
        location: input.location,
        province: input.province,
        location_link: input.location_link,
        latitude,
        longitude,
        author_id: Some(author),
        created_at: Utc::now(),
    })
}

/// A `TripPatch` whose title and coordinates have been validated.
/// Outer `None` leaves the field unchanged.
#[derive(Debug, Default)]
struct CheckedPatch {
    title: Option<String>,
    description: Option<Option<String>>,
    photos: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    location: Option<Option<String>>,
    province: Option<Option<String>>,
    location_link: Option<Option<String>>,
    latitude: Option<Option<f64>>,
    longitude: Option<Option<f64>>,
}

impl CheckedPatch {
    fn check(patch: TripPatch) -> Result<Self, ServiceError> {
        let title = patch.title.map(required_title).transpose()?;
        let latitude = patch
            .latitude
            .map(|value| resolve_coordinate(value.as_ref(), "latitude"))
            .transpose()?;
        let longitude = patch
            .longitude
            .map(|value| resolve_coordinate(value.as_ref(), "longitude"))
            .transpose()?;

        Ok(Self {
            title,
            description: patch.description,
            photos: patch.photos,
            tags: patch.tags,
            location: patch.location,
            province: patch.province,
            location_link: patch.location_link,
            latitude,
            longitude,
        })
    }

    /// Overlay the present fields. Ownership and timestamps are never
    /// touched here.
    fn apply(self, trip: &mut Trip) {
        if let Some(title) = self.title {
            trip.title = title;
        }
        if let Some(description) = self.description {
            trip.description = description;
        }
        if let Some(photos) = self.photos {
            trip.photos = photos;
        }
        if let Some(tags) = self.tags {
            trip.tags = tags;
        }
        if let Some(location) = self.location {
            trip.location = location;
        }
        if let Some(province) = self.province {
            trip.province = province;
        }
        if let Some(location_link) = self.location_link {
            trip.location_link = location_link;
        }
        if let Some(latitude) = self.latitude {
            trip.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            trip.longitude = longitude;
        }
    }
}
