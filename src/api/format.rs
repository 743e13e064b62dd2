//! JSON shapes returned by the trip endpoints.
//!
//! Listings use the compact `TripSummary`; single-trip responses and the
//! results of create/update use `TripDetail`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::trip::Ownership;
use crate::services::{TripListing, TripView};
use crate::types::{TripId, UserId};

/// Shown for trips created before authors were recorded
const LEGACY_AUTHOR_NAME: &str = "Travel Blogger";
const LEGACY_AUTHOR_EMAIL: &str = "blogger@example.com";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Option<UserId>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl AuthorView {
    fn of(view: &TripView) -> Self {
        match (&view.author, view.trip.ownership) {
            (Some(author), _) => Self {
                id: Some(author.id),
                display_name: Some(author.display_name.clone()),
                email: Some(author.email.clone()),
            },
            // Owner id is known but the account row is gone.
            (None, Ownership::Owned(id)) => Self {
                id: Some(id),
                display_name: None,
                email: None,
            },
            (None, Ownership::Unowned) => Self {
                id: None,
                display_name: Some(LEGACY_AUTHOR_NAME.to_string()),
                email: Some(LEGACY_AUTHOR_EMAIL.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub province: Option<String>,
    pub tags: Vec<String>,
    pub photos: Vec<String>,
    pub location: Option<String>,
    pub location_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
}

impl From<&TripView> for TripSummary {
    fn from(view: &TripView) -> Self {
        let trip = &view.trip;
        let author = AuthorView::of(view);
        Self {
            id: trip.id,
            title: trip.title.clone(),
            description: trip.short_description(),
            cover_image: trip.cover_image().map(str::to_string),
            province: trip.display_province().map(str::to_string),
            tags: trip.tags.clone(),
            photos: trip.photos.clone(),
            location: trip.location.clone(),
            location_link: trip.location_link.clone(),
            created_at: trip.created_at,
            updated_at: trip.updated_at,
            author_id: author.id,
            author_name: author.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetail {
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    pub photos: Vec<String>,
    pub tags: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub location_link: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Option<UserId>,
    pub author: AuthorView,
}

impl From<&TripView> for TripDetail {
    fn from(view: &TripView) -> Self {
        let trip = &view.trip;
        Self {
            id: trip.id,
            title: trip.title.clone(),
            description: trip.description.clone(),
            photos: trip.photos.clone(),
            tags: trip.tags.clone(),
            latitude: trip.latitude,
            longitude: trip.longitude,
            location: trip.location.clone(),
            province: trip.province.clone(),
            location_link: trip.location_link.clone(),
            cover_image: trip.cover_image().map(str::to_string),
            created_at: trip.created_at,
            updated_at: trip.updated_at,
            author_id: trip.ownership.owner_id(),
            author: AuthorView::of(view),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TripList {
    pub trips: Vec<TripSummary>,
    pub total: usize,
}

impl From<&TripListing> for TripList {
    fn from(listing: &TripListing) -> Self {
        Self {
            trips: listing.trips.iter().map(TripSummary::from).collect(),
            total: listing.total,
        }
    }
}

/// `GET /api/trips/mine`: the listing plus the caller's id, which clients
/// compare against `authorId` to decide what to offer for editing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnTripList {
    pub trips: Vec<TripSummary>,
    pub total: usize,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub id: TripId,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::trip::Trip;
    use crate::services::AuthorProfile;
    use serde_json::json;

    fn view(ownership: Ownership, author: Option<AuthorProfile>) -> TripView {
        let now = Utc::now();
        TripView {
            trip: Trip {
                id: 12,
                title: "Chanthaburi".into(),
                description: Some("word ".repeat(40)),
                photos: vec!["cover.jpg".into(), "second.jpg".into()],
                tags: vec!["ผลไม้".into(), "จังหวัดจันทบุรี".into()],
                location: None,
                province: None,
                location_link: None,
                latitude: Some(12.6),
                longitude: None,
                ownership,
                created_at: now,
                updated_at: now,
            },
            author,
        }
    }

    #[test]
    fn summary_uses_derived_fields() {
        let summary = serde_json::to_value(TripSummary::from(&view(Ownership::Unowned, None))).unwrap();

        assert_eq!(summary["coverImage"], "cover.jpg");
        assert_eq!(summary["province"], "จังหวัดจันทบุรี");
        assert!(summary["description"].as_str().unwrap().ends_with("..."));
        assert_eq!(summary["authorId"], json!(null));
        assert_eq!(summary["authorName"], "Travel Blogger");
    }

    #[test]
    fn detail_carries_author_block() {
        let author = AuthorProfile {
            id: 4,
            display_name: "Ploy".into(),
            email: "ploy@example.com".into(),
        };
        let detail = serde_json::to_value(TripDetail::from(&view(Ownership::Owned(4), Some(author)))).unwrap();

        assert_eq!(detail["authorId"], 4);
        assert_eq!(detail["author"], json!({"id": 4, "displayName": "Ploy", "email": "ploy@example.com"}));
        assert_eq!(detail["latitude"], 12.6);
        assert_eq!(detail["description"].as_str().unwrap().len(), 200);
    }

    #[test]
    fn legacy_author_placeholder() {
        let detail = serde_json::to_value(TripDetail::from(&view(Ownership::Unowned, None))).unwrap();
        assert_eq!(
            detail["author"],
            json!({"id": null, "displayName": "Travel Blogger", "email": "blogger@example.com"})
        );
    }
}
