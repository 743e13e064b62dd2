//! In-process stores with the same contracts as the Postgres ones.
//! Used by tests and by `STORAGE_BACKEND=memory` for local runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::trip::{NewTripRecord, TripRecord};
use crate::database::models::user::{NewUser, User};
use crate::database::trip_store::{PageRequest, TripStore};
use crate::database::user_store::UserStore;
use crate::types::{TripId, UserId};

struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct MemoryTripStore {
    table: RwLock<Table<TripRecord>>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a row verbatim, keeping its id and timestamps. Later inserts
    /// continue numbering after the highest id seen.
    pub async fn seed(&self, record: TripRecord) {
        let mut table = self.table.write().await;
        table.last_id = table.last_id.max(record.id);
        table.rows.insert(record.id, record);
    }

    fn newest_first(mut rows: Vec<TripRecord>) -> Vec<TripRecord> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn find_by_id(&self, id: TripId) -> Result<Option<TripRecord>, DatabaseError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<TripRecord>, DatabaseError> {
        let rows = Self::newest_first(self.table.read().await.rows.values().cloned().collect());
        Ok(match page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            None => rows,
        })
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<TripRecord>, DatabaseError> {
        let rows = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|r| r.author_id == Some(author_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }

    async fn search(&self, text: &str) -> Result<Vec<TripRecord>, DatabaseError> {
        let needle = text.to_lowercase();
        let rows = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|r| {
                contains_ci(Some(&r.title), &needle)
                    || contains_ci(r.description.as_deref(), &needle)
                    || contains_ci(r.location.as_deref(), &needle)
                    || contains_ci(r.province.as_deref(), &needle)
                    || contains_ci(r.tags.as_deref(), &needle)
            })
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }

    async fn insert(&self, trip: NewTripRecord) -> Result<TripRecord, DatabaseError> {
        let mut table = self.table.write().await;
        let id = table.next_id();
        let record = TripRecord {
            id,
            title: trip.title,
            description: trip.description,
            photos: Some(trip.photos),
            tags: Some(trip.tags),
            location: trip.location,
            province: trip.province,
            location_link: trip.location_link,
            latitude: trip.latitude,
            longitude: trip.longitude,
            author_id: trip.author_id,
            created_at: trip.created_at,
            updated_at: trip.created_at,
        };
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, trip: TripRecord) -> Result<TripRecord, DatabaseError> {
        let mut table = self.table.write().await;
        let existing = table
            .rows
            .get_mut(&trip.id)
            .ok_or_else(|| DatabaseError::QueryError(format!("trip {} vanished during update", trip.id)))?;

        existing.title = trip.title;
        existing.description = trip.description;
        existing.photos = trip.photos;
        existing.tags = trip.tags;
        existing.location = trip.location;
        existing.province = trip.province;
        existing.location_link = trip.location_link;
        existing.latitude = trip.latitude;
        existing.longitude = trip.longitude;
        existing.updated_at = trip.updated_at;
        Ok(existing.clone())
    }

    async fn delete(&self, trip: &TripRecord) -> Result<(), DatabaseError> {
        self.table.write().await.rows.remove(&trip.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<Table<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DatabaseError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn save(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::QueryError(format!(
                "duplicate key value violates unique constraint on email {}",
                user.email
            )));
        }
        let id = table.next_id();
        let record = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            name: user.name,
            profile_image: user.profile_image,
            created_at: Utc::now(),
        };
        table.rows.insert(id, record.clone());
        Ok(record)
    }
}
