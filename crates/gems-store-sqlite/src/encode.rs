//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! sets and lists compact JSON arrays.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gems_core::{
  badge::BadgeId,
  collection::Collection,
  geo::Coordinates,
  location::{Location, Review},
  user::User,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// SQLite integers are signed; point totals saturate at `i64::MAX`.
pub fn encode_points(points: u64) -> i64 { i64::try_from(points).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_badges(badges: &BTreeSet<BadgeId>) -> Result<String> {
  Ok(serde_json::to_string(badges)?)
}

pub fn encode_strings<'a, I>(items: I) -> Result<String>
where
  I: IntoIterator<Item = &'a String>,
{
  Ok(serde_json::to_string(&items.into_iter().collect::<Vec<_>>())?)
}

pub fn encode_uuids(ids: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(&ids.iter().map(|id| encode_uuid(*id)).collect::<Vec<_>>())?)
}

fn decode_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, email, display_name, photo_url, points, badges, created_at";

/// Raw strings read from a `users` row plus its bookmark ids.
pub struct RawUser {
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
  pub photo_url:    Option<String>,
  pub points:       i64,
  pub badges:       String,
  pub created_at:   String,
  pub bookmarks:    Vec<String>,
}

impl RawUser {
  /// Read the [`USER_COLUMNS`]; bookmarks are filled in separately.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      email:        row.get(1)?,
      display_name: row.get(2)?,
      photo_url:    row.get(3)?,
      points:       row.get(4)?,
      badges:       row.get(5)?,
      created_at:   row.get(6)?,
      bookmarks:    Vec::new(),
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:                 decode_uuid(&self.user_id)?,
      email:                   self.email,
      display_name:            self.display_name,
      photo_url:               self.photo_url,
      bookmarked_location_ids: self
        .bookmarks
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      points:                  decode_count(self.points),
      badges:                  decode_json(&self.badges)?,
      created_at:              decode_dt(&self.created_at)?,
    })
  }
}

pub const LOCATION_COLUMNS: &str = "location_id, name, description, latitude, longitude, \
   address, image_urls, tags, creator_id, created_at, average_rating";

/// Raw values read from a `locations` row.
pub struct RawLocation {
  pub location_id:    String,
  pub name:           String,
  pub description:    String,
  pub latitude:       f64,
  pub longitude:      f64,
  pub address:        String,
  pub image_urls:     String,
  pub tags:           String,
  pub creator_id:     String,
  pub created_at:     String,
  pub average_rating: f64,
}

impl RawLocation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      location_id:    row.get(0)?,
      name:           row.get(1)?,
      description:    row.get(2)?,
      latitude:       row.get(3)?,
      longitude:      row.get(4)?,
      address:        row.get(5)?,
      image_urls:     row.get(6)?,
      tags:           row.get(7)?,
      creator_id:     row.get(8)?,
      created_at:     row.get(9)?,
      average_rating: row.get(10)?,
    })
  }

  pub fn into_location(self) -> Result<Location> {
    Ok(Location {
      location_id:    decode_uuid(&self.location_id)?,
      name:           self.name,
      description:    self.description,
      coordinates:    Coordinates {
        latitude:  self.latitude,
        longitude: self.longitude,
      },
      address:        self.address,
      image_urls:     decode_json(&self.image_urls)?,
      tags:           decode_json(&self.tags)?,
      creator_id:     decode_uuid(&self.creator_id)?,
      created_at:     decode_dt(&self.created_at)?,
      average_rating: self.average_rating,
    })
  }
}

pub const REVIEW_COLUMNS: &str =
  "review_id, location_id, author_id, rating, comment, created_at";

pub struct RawReview {
  pub review_id:   String,
  pub location_id: String,
  pub author_id:   String,
  pub rating:      u8,
  pub comment:     String,
  pub created_at:  String,
}

impl RawReview {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:   row.get(0)?,
      location_id: row.get(1)?,
      author_id:   row.get(2)?,
      rating:      row.get(3)?,
      comment:     row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:   decode_uuid(&self.review_id)?,
      location_id: decode_uuid(&self.location_id)?,
      author_id:   decode_uuid(&self.author_id)?,
      rating:      self.rating,
      comment:     self.comment,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const COLLECTION_COLUMNS: &str =
  "collection_id, name, description, creator_id, location_ids, is_public, created_at";

pub struct RawCollection {
  pub collection_id: String,
  pub name:          String,
  pub description:   String,
  pub creator_id:    String,
  pub location_ids:  String,
  pub is_public:     bool,
  pub created_at:    String,
}

impl RawCollection {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection_id: row.get(0)?,
      name:          row.get(1)?,
      description:   row.get(2)?,
      creator_id:    row.get(3)?,
      location_ids:  row.get(4)?,
      is_public:     row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_collection(self) -> Result<Collection> {
    let ids: Vec<String> = decode_json(&self.location_ids)?;
    Ok(Collection {
      collection_id: decode_uuid(&self.collection_id)?,
      name:          self.name,
      description:   self.description,
      creator_id:    decode_uuid(&self.creator_id)?,
      location_ids:  ids.iter().map(|s| decode_uuid(s)).collect::<Result<_>>()?,
      is_public:     self.is_public,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
