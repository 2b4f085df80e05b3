//! Locations ("gems") and their reviews.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, geo::Coordinates};

/// A user-contributed point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
  pub location_id:    Uuid,
  pub name:           String,
  pub description:    String,
  pub coordinates:    Coordinates,
  pub address:        String,
  pub image_urls:     Vec<String>,
  pub tags:           BTreeSet<String>,
  pub creator_id:     Uuid,
  pub created_at:     DateTime<Utc>,
  /// Mean of all review ratings, or 0 without reviews. Maintained by the
  /// store; never set directly.
  pub average_rating: f64,
}

/// Input to [`crate::store::GemStore::create_location`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
  pub name:        String,
  pub description: String,
  pub coordinates: Coordinates,
  #[serde(default)]
  pub address:     String,
  #[serde(default)]
  pub image_urls:  Vec<String>,
  #[serde(default)]
  pub tags:        BTreeSet<String>,
  pub creator_id:  Uuid,
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A rating and comment left on exactly one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   Uuid,
  pub location_id: Uuid,
  pub author_id:   Uuid,
  pub rating:      u8,
  pub comment:     String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::GemStore::add_review`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub author_id: Uuid,
  pub rating:    u8,
  #[serde(default)]
  pub comment:   String,
}

impl NewReview {
  pub fn validate(&self) -> Result<()> {
    if (MIN_RATING..=MAX_RATING).contains(&self.rating) {
      Ok(())
    } else {
      Err(Error::InvalidRating(self.rating))
    }
  }
}

/// Mean rating, or 0 for an empty set.
pub fn average_rating(ratings: &[u8]) -> f64 {
  if ratings.is_empty() {
    return 0.0;
  }
  let total: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
  total as f64 / ratings.len() as f64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rating_bounds() {
    let review = |rating| NewReview { author_id: Uuid::nil(), rating, comment: String::new() };
    assert!(review(0).validate().is_err());
    assert!(review(1).validate().is_ok());
    assert!(review(5).validate().is_ok());
    assert!(matches!(review(6).validate(), Err(Error::InvalidRating(6))));
  }

  #[test]
  fn average_of_no_reviews_is_zero() {
    assert_eq!(average_rating(&[]), 0.0);
    assert_eq!(average_rating(&[4, 5]), 4.5);
  }
}
