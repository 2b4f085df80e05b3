//! The static badge catalog.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

use crate::{Error, Result};

/// Identifier of a badge. The kebab-case name is the stored and wire form.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BadgeId {
  FirstGem,
  Explorer,
  Critic,
  Photographer,
  LocalExpert,
  CommunityHelper,
}

/// Display metadata for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
  pub id:          BadgeId,
  pub name:        &'static str,
  pub description: &'static str,
  pub icon:        &'static str,
  pub requirement: &'static str,
}

impl BadgeId {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a stored badge id.
  pub fn from_name(name: &str) -> Result<Self> {
    name.parse().map_err(|_| Error::UnknownBadge(name.to_owned()))
  }

  pub fn badge(self) -> Badge {
    let (name, description, icon, requirement) = match self {
      Self::FirstGem => (
        "First Gem",
        "Added your first location to Local Gems",
        "💎",
        "Add your first location",
      ),
      Self::Explorer => (
        "Explorer",
        "Added 5 or more locations",
        "🗺️",
        "Add 5 locations",
      ),
      Self::Critic => (
        "Critic",
        "Written 10 or more reviews",
        "✍️",
        "Write 10 reviews",
      ),
      Self::Photographer => (
        "Photographer",
        "Uploaded 25 quality photos",
        "📷",
        "Upload 25 photos",
      ),
      Self::LocalExpert => (
        "Local Expert",
        "Added 20 locations in your area",
        "🏆",
        "Add 20 local locations",
      ),
      Self::CommunityHelper => (
        "Community Helper",
        "Helped verify 10 locations",
        "🤝",
        "Verify 10 locations",
      ),
    };
    Badge { id: self, name, description, icon, requirement }
  }
}

/// Every badge in the catalog.
pub fn all_badges() -> Vec<Badge> { BadgeId::iter().map(BadgeId::badge).collect() }
