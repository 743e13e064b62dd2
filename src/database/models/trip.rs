use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::list_codec;
use crate::types::{TripId, UserId};

/// A `trips` row as stored. `photos` and `tags` hold list-codec text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TripRecord {
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    pub photos: Option<String>,
    pub tags: Option<String>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub location_link: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTripRecord {
    pub title: String,
    pub description: Option<String>,
    pub photos: String,
    pub tags: String,
    pub location: Option<String>,
    pub province: Option<String>,
    pub location_link: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Who may mutate a trip. Rows created before authors were recorded are
/// `Unowned` and stay editable by any signed-in caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Ownership {
    Owned(UserId),
    Unowned,
}

impl Ownership {
    pub fn owner_id(self) -> Option<UserId> {
        match self {
            Ownership::Owned(id) => Some(id),
            Ownership::Unowned => None,
        }
    }
}

impl From<Option<UserId>> for Ownership {
    fn from(author_id: Option<UserId>) -> Self {
        author_id.map_or(Ownership::Unowned, Ownership::Owned)
    }
}

/// Trip with list fields decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    pub photos: Vec<String>,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub location_link: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ownership: Ownership,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maximum length of the listing blurb, in characters.
const SHORT_DESCRIPTION_LIMIT: usize = 120;
/// A word break after this many characters is preferred over a hard cut.
const SHORT_DESCRIPTION_SOFT_BREAK: usize = 100;

/// Tag fragments that identify a province or country on legacy rows.
const PROVINCE_HINTS: &[&str] = &[
    "จังหวัด",
    "ตราด",
    "ชลบุรี",
    "กาญจนบุรี",
    "เชียงใหม่",
    "สตูล",
    "กรุงเทพมหานคร",
    "ไต้หวัน",
    "ญี่ปุ่น",
    "ฝรั่งเศส",
    "ฟินแลนด์",
];

impl From<TripRecord> for Trip {
    fn from(record: TripRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            photos: list_codec::decode_column(record.photos.as_deref()),
            tags: list_codec::decode_column(record.tags.as_deref()),
            location: record.location,
            province: record.province,
            location_link: record.location_link,
            latitude: record.latitude,
            longitude: record.longitude,
            ownership: Ownership::from(record.author_id),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl Trip {
    /// Back into the stored shape, re-encoding the list fields.
    pub fn to_record(&self) -> TripRecord {
        TripRecord {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            photos: Some(list_codec::encode(&self.photos)),
            tags: Some(list_codec::encode(&self.tags)),
            location: self.location.clone(),
            province: self.province.clone(),
            location_link: self.location_link.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            author_id: self.ownership.owner_id(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }

    pub fn short_description(&self) -> Option<String> {
        self.description.as_deref().map(shorten)
    }

    /// Stored province, or a best guess from the tags for rows that predate the column.
    pub fn display_province(&self) -> Option<&str> {
        if let Some(province) = self.province.as_deref() {
            if !province.trim().is_empty() {
                return Some(province);
            }
        }

        self.tags
            .iter()
            .find(|tag| PROVINCE_HINTS.iter().any(|hint| tag.contains(hint)))
            .or_else(|| self.tags.last())
            .map(String::as_str)
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= SHORT_DESCRIPTION_LIMIT {
        return text.to_string();
    }

    let truncated: String = text.chars().take(SHORT_DESCRIPTION_LIMIT).collect();
    let last_space = truncated
        .char_indices()
        .filter(|(_, c)| *c == ' ')
        .map(|(byte_idx, _)| byte_idx)
        .last();

    match last_space {
        Some(byte_idx) if truncated[..byte_idx].chars().count() > SHORT_DESCRIPTION_SOFT_BREAK => {
            format!("{}...", &truncated[..byte_idx])
        }
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> Trip {
        let now = Utc::now();
        Trip {
            id: 1,
            title: "Koh Chang".into(),
            description: None,
            photos: vec![],
            tags: vec![],
            location: None,
            province: None,
            location_link: None,
            latitude: None,
            longitude: None,
            ownership: Ownership::Unowned,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ownership_maps_from_nullable_author() {
        assert_eq!(Ownership::from(None), Ownership::Unowned);
        assert_eq!(Ownership::from(Some(4)), Ownership::Owned(4));
        assert_eq!(Ownership::Owned(4).owner_id(), Some(4));
    }

    #[test]
    fn record_conversion_decodes_and_reencodes_lists() {
        let mut t = trip();
        t.photos = vec!["a.jpg".into(), "b.jpg".into()];
        t.ownership = Ownership::Owned(5);

        let record = t.to_record();
        assert_eq!(record.photos.as_deref(), Some("{a.jpg,b.jpg}"));
        assert_eq!(record.tags.as_deref(), Some("{}"));
        assert_eq!(record.author_id, Some(5));
        assert_eq!(Trip::from(record), t);
    }

    #[test]
    fn cover_image_is_first_photo() {
        let mut t = trip();
        assert_eq!(t.cover_image(), None);
        t.photos = vec!["first.jpg".into(), "second.jpg".into()];
        assert_eq!(t.cover_image(), Some("first.jpg"));
    }

    #[test]
    fn short_description_keeps_short_text() {
        let mut t = trip();
        t.description = Some("short and sweet".into());
        assert_eq!(t.short_description().as_deref(), Some("short and sweet"));
    }

    #[test]
    fn short_description_prefers_word_break_after_soft_limit() {
        let mut t = trip();
        let text = format!("{} {}", "a".repeat(110), "b".repeat(30));
        t.description = Some(text);
        assert_eq!(t.short_description(), Some(format!("{}...", "a".repeat(110))));
    }

    #[test]
    fn short_description_hard_cuts_without_late_space() {
        let mut t = trip();
        t.description = Some("x".repeat(200));
        assert_eq!(t.short_description(), Some(format!("{}...", "x".repeat(120))));
    }

    #[test]
    fn short_description_counts_characters_not_bytes() {
        let mut t = trip();
        t.description = Some("ท".repeat(130));
        let short = t.short_description().unwrap();
        assert_eq!(short.chars().count(), 123);
    }

    #[test]
    fn province_prefers_stored_value() {
        let mut t = trip();
        t.province = Some("ตราด".into());
        t.tags = vec!["ทะเล".into(), "ชลบุรี".into()];
        assert_eq!(t.display_province(), Some("ตราด"));
    }

    #[test]
    fn province_falls_back_to_hinted_then_last_tag() {
        let mut t = trip();
        t.province = Some("  ".into());
        t.tags = vec!["เกาะ".into(), "ตราด".into(), "ทะเล".into()];
        assert_eq!(t.display_province(), Some("ตราด"));

        t.tags = vec!["cafe".into(), "bangkok".into()];
        assert_eq!(t.display_province(), Some("bangkok"));

        t.tags.clear();
        assert_eq!(t.display_province(), None);
    }
}
