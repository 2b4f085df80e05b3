//! [`PointsService`] awards points through an [`ActivityLedger`].
//!
//! The service reads the user, evaluates the engine in [`crate::points`],
//! and writes the result back. It does not serialise concurrent awards for
//! the same user; two racing calls overwrite each other's result.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  points::{self, ActionKind, Award, MilestoneCheck},
  store::ActivityLedger,
  user::UserUpdate,
};

pub struct PointsService<S> {
  store: Arc<S>,
}

impl<S> Clone for PointsService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ActivityLedger> PointsService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Reward `user_id` for `action` and persist the new totals.
  ///
  /// If the activity counts cannot be read, the action's own points and
  /// badge are still applied and the award reports
  /// [`MilestoneCheck::Skipped`]. If the write fails the computed award is
  /// returned inside [`Error::PersistenceFailure`].
  pub async fn award_points(&self, user_id: Uuid, action: ActionKind) -> Result<Award> {
    let user = self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UserNotFound(user_id))?;

    let mut award = match self.store.activity_counts(user_id).await {
      Ok(counts) => points::award(&user, action, Some(&counts)),
      Err(e) => {
        warn!(%user_id, error = %e, "activity counts unavailable; skipping milestone badges");
        let mut award = points::award(&user, action, None);
        award.milestones = MilestoneCheck::Skipped { reason: Some(e.to_string()) };
        award
      }
    };

    let update = UserUpdate {
      points: Some(award.user.points),
      badges: Some(award.user.badges.clone()),
      ..UserUpdate::default()
    };

    match self.store.update_user(user_id, update).await {
      Ok(stored) => {
        award.user = stored;
        info!(
          %user_id,
          action = action.as_ref(),
          points = award.points_awarded,
          badges = ?award.badges_awarded,
          "awarded points"
        );
        Ok(award)
      }
      Err(e) => Err(Error::PersistenceFailure {
        award:  Box::new(award),
        source: Box::new(e),
      }),
    }
  }
}
