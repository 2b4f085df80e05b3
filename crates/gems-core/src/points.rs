//! The points and badges engine.
//!
//! Everything here is a pure function of its inputs. Aggregate activity
//! counts are supplied by the caller; fetching and persisting is the job of
//! [`crate::award::PointsService`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::{Error, Result, badge::BadgeId, user::User};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// A rewarded user action.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
  AddLocation,
  WriteReview,
  UploadPhoto,
  FirstGem,
  VerifiedLocation,
}

/// The fixed reward attached to an [`ActionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsAction {
  pub action: ActionKind,
  pub points: u64,
  /// Awarded the first time the action is performed.
  pub badge:  Option<BadgeId>,
}

impl ActionKind {
  /// Parse a wire name such as `"add_location"`.
  pub fn from_name(name: &str) -> Result<Self> {
    name
      .parse()
      .map_err(|_| Error::UnrecognizedAction(name.to_owned()))
  }

  pub fn reward(self) -> PointsAction {
    let (points, badge) = match self {
      Self::AddLocation => (10, None),
      Self::WriteReview => (5, None),
      Self::UploadPhoto => (3, None),
      Self::FirstGem => (20, Some(BadgeId::FirstGem)),
      Self::VerifiedLocation => (15, None),
    };
    PointsAction { action: self, points, badge }
  }
}

// ─── Milestones ──────────────────────────────────────────────────────────────

/// Per-user aggregate counts used for milestone badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
  pub locations_added: u64,
  pub reviews_written: u64,
  pub photos_uploaded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
  LocationsAdded,
  ReviewsWritten,
  PhotosUploaded,
}

impl ActivityCounts {
  pub fn get(&self, metric: Metric) -> u64 {
    match metric {
      Metric::LocationsAdded => self.locations_added,
      Metric::ReviewsWritten => self.reviews_written,
      Metric::PhotosUploaded => self.photos_uploaded,
    }
  }
}

/// A badge earned once `metric` reaches `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct Milestone {
  pub badge:     BadgeId,
  pub metric:    Metric,
  pub threshold: u64,
}

pub const MILESTONES: &[Milestone] = &[
  Milestone { badge: BadgeId::Explorer,     metric: Metric::LocationsAdded, threshold: 5 },
  Milestone { badge: BadgeId::Critic,       metric: Metric::ReviewsWritten, threshold: 10 },
  Milestone { badge: BadgeId::Photographer, metric: Metric::PhotosUploaded, threshold: 25 },
  Milestone { badge: BadgeId::LocalExpert,  metric: Metric::LocationsAdded, threshold: 20 },
];

/// Badges `counts` qualify for that are not already in `current`.
pub fn check_milestones(
  counts: &ActivityCounts,
  current: &BTreeSet<BadgeId>,
) -> BTreeSet<BadgeId> {
  MILESTONES
    .iter()
    .filter(|m| counts.get(m.metric) >= m.threshold)
    .map(|m| m.badge)
    .filter(|badge| !current.contains(badge))
    .collect()
}

// ─── Reducer ─────────────────────────────────────────────────────────────────

/// Add the action's points and its immediate badge, if any.
pub fn apply_action(user: &User, action: ActionKind) -> User {
  let reward = action.reward();
  let mut next = user.clone();
  next.points = next.points.saturating_add(reward.points);
  if let Some(badge) = reward.badge {
    next.badges.insert(badge);
  }
  next
}

/// Whether milestone badges were evaluated for an award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MilestoneCheck {
  Evaluated,
  /// Activity counts were unavailable; milestone badges were not checked
  /// and none were awarded.
  Skipped { reason: Option<String> },
}

impl MilestoneCheck {
  pub fn is_evaluated(&self) -> bool { matches!(self, Self::Evaluated) }
}

/// The result of rewarding one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
  /// The user with the new point total and badge set.
  pub user:           User,
  pub action:         ActionKind,
  pub points_awarded: u64,
  /// Badges this call added; empty when everything was already held.
  pub badges_awarded: BTreeSet<BadgeId>,
  pub milestones:     MilestoneCheck,
}

/// Apply `action` to `user` and, when `counts` is available, union in any
/// milestone badges they now qualify for.
pub fn award(user: &User, action: ActionKind, counts: Option<&ActivityCounts>) -> Award {
  let mut next = apply_action(user, action);

  let milestones = match counts {
    Some(counts) => {
      next.badges.extend(check_milestones(counts, &next.badges));
      MilestoneCheck::Evaluated
    }
    None => MilestoneCheck::Skipped { reason: None },
  };

  let badges_awarded = next.badges.difference(&user.badges).copied().collect();

  Award {
    points_awarded: next.points - user.points,
    user: next,
    action,
    badges_awarded,
    milestones,
  }
}

// ─── Display ─────────────────────────────────────────────────────────────────

/// `999`, `1.5K`, `2.5M`. The decimal is truncated, so `1999` is `1.9K`.
pub fn format_points(points: u64) -> String {
  if points >= 1_000_000 {
    let tenths = points / 100_000;
    format!("{}.{}M", tenths / 10, tenths % 10)
  } else if points >= 1_000 {
    let tenths = points / 100;
    format!("{}.{}K", tenths / 10, tenths % 10)
  } else {
    points.to_string()
  }
}
