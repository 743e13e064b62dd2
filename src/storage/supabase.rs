use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{object_key, ObjectStore, StorageError};
use crate::config::StorageConfig;

/// Supabase Storage bucket accessed over its REST API
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl SupabaseStorage {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let base_url = config
            .supabase_url
            .as_deref()
            .ok_or(StorageError::ConfigMissing("SUPABASE_URL"))?;
        let api_key = config
            .supabase_api_key
            .as_deref()
            .ok_or(StorageError::ConfigMissing("SUPABASE_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: config.supabase_bucket.clone(),
            api_key: api_key.to_string(),
        })
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(filename);
        let size = bytes.len();
        tracing::info!("Uploading {} ({} bytes) to bucket {}", key, size, self.bucket);

        let response = self
            .client
            .put(self.upload_url(&key))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Upload failed".to_string());
            tracing::error!("Supabase rejected upload of {}: {} {}", key, status, message);
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(&key))
    }
}
