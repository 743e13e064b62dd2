use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::trip::{NewTripRecord, TripRecord};
use crate::types::{TripId, UserId};

/// Zero-based page window for newest-first listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// Persistence for trip rows. Implementations own their own consistency;
/// callers issue each call once and do not retry.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn find_by_id(&self, id: TripId) -> Result<Option<TripRecord>, DatabaseError>;

    /// All rows ordered by `created_at` descending, optionally windowed
    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<TripRecord>, DatabaseError>;

    /// Rows authored by `author_id`, newest first
    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<TripRecord>, DatabaseError>;

    /// Case-insensitive substring match across title, description, location,
    /// province and the encoded tags column
    async fn search(&self, text: &str) -> Result<Vec<TripRecord>, DatabaseError>;

    async fn insert(&self, trip: NewTripRecord) -> Result<TripRecord, DatabaseError>;

    /// Overwrite the content columns of an existing row. `id`, `author_id`
    /// and `created_at` are never written.
    async fn update(&self, trip: TripRecord) -> Result<TripRecord, DatabaseError>;

    async fn delete(&self, trip: &TripRecord) -> Result<(), DatabaseError>;
}

const TRIP_COLUMNS: &str = "id, title, description, photos, tags, location, province, \
     location_link, latitude, longitude, author_id, created_at, updated_at";

/// Postgres-backed trip store
#[derive(Clone)]
pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so the search text matches literally
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn find_by_id(&self, id: TripId) -> Result<Option<TripRecord>, DatabaseError> {
        let sql = format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS);
        let row = sqlx::query_as::<_, TripRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<TripRecord>, DatabaseError> {
        let rows = match page {
            Some(page) => {
                let sql = format!(
                    "SELECT {} FROM trips ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
                    TRIP_COLUMNS
                );
                sqlx::query_as::<_, TripRecord>(&sql)
                    .bind(page.limit())
                    .bind(page.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM trips ORDER BY created_at DESC, id DESC",
                    TRIP_COLUMNS
                );
                sqlx::query_as::<_, TripRecord>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<TripRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM trips WHERE author_id = $1 ORDER BY created_at DESC, id DESC",
            TRIP_COLUMNS
        );
        let rows = sqlx::query_as::<_, TripRecord>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn search(&self, text: &str) -> Result<Vec<TripRecord>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {} FROM trips
            WHERE title ILIKE $1
               OR description ILIKE $1
               OR location ILIKE $1
               OR province ILIKE $1
               OR tags ILIKE $1
            ORDER BY created_at DESC, id DESC
            "#,
            TRIP_COLUMNS
        );
        let rows = sqlx::query_as::<_, TripRecord>(&sql)
            .bind(like_pattern(text))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, trip: NewTripRecord) -> Result<TripRecord, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO trips (
                title, description, photos, tags, location, province,
                location_link, latitude, longitude, author_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        let row = sqlx::query_as::<_, TripRecord>(&sql)
            .bind(&trip.title)
            .bind(&trip.description)
            .bind(&trip.photos)
            .bind(&trip.tags)
            .bind(&trip.location)
            .bind(&trip.province)
            .bind(&trip.location_link)
            .bind(trip.latitude)
            .bind(trip.longitude)
            .bind(trip.author_id)
            .bind(trip.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, trip: TripRecord) -> Result<TripRecord, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE trips SET
                title = $2, description = $3, photos = $4, tags = $5,
                location = $6, province = $7, location_link = $8,
                latitude = $9, longitude = $10, updated_at = $11
            WHERE id = $1
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        let row = sqlx::query_as::<_, TripRecord>(&sql)
            .bind(trip.id)
            .bind(&trip.title)
            .bind(&trip.description)
            .bind(&trip.photos)
            .bind(&trip.tags)
            .bind(&trip.location)
            .bind(&trip.province)
            .bind(&trip.location_link)
            .bind(trip.latitude)
            .bind(trip.longitude)
            .bind(trip.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DatabaseError::QueryError(format!("trip {} vanished during update", trip.id)))
    }

    async fn delete(&self, trip: &TripRecord) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(trip.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
