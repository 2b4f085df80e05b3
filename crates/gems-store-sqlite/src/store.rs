//! [`SqliteStore`]: the SQLite implementation of [`GemStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use gems_core::{
  collection::{Collection, NewCollection},
  geo::BoundingBox,
  location::{Location, NewLocation, NewReview, Review, average_rating},
  store::{ActivityLedger, GemStore, LocationQuery},
  user::{NewUser, User, UserUpdate},
};

use crate::{
  Error, Result,
  encode::{
    COLLECTION_COLUMNS, LOCATION_COLUMNS, REVIEW_COLUMNS, RawCollection, RawLocation,
    RawReview, RawUser, USER_COLUMNS, decode_count, encode_badges, encode_dt,
    encode_points, encode_strings, encode_uuid, encode_uuids,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_bookmarks(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn
    .prepare("SELECT location_id FROM bookmarks WHERE user_id = ?1 ORDER BY location_id")?;
  let ids = stmt
    .query_map(params![user_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

fn read_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawUser>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      params![user_id],
      RawUser::from_row,
    )
    .optional()?;

  match raw {
    Some(mut raw) => {
      raw.bookmarks = read_bookmarks(conn, user_id)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

fn exists(conn: &Connection, sql: &str, id: &str) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params![id], |_| Ok(())).optional()?.is_some())
}

fn query_locations<P: rusqlite::Params>(
  conn: &Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawLocation>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, RawLocation::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn query_collections<P: rusqlite::Params>(
  conn: &Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawCollection>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, RawCollection::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn into_locations(raws: Vec<RawLocation>) -> Result<Vec<Location>> {
  raws.into_iter().map(RawLocation::into_location).collect()
}

fn into_collections(raws: Vec<RawCollection>) -> Result<Vec<Collection>> {
  raws.into_iter().map(RawCollection::into_collection).collect()
}

/// Escape `LIKE` wildcards with a backslash so user text matches literally.
fn escape_like(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

/// Outcome of a bookmark toggle inside one transaction.
enum Toggle {
  NoUser,
  NoLocation,
  Done(bool),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Local Gems store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on the connection's thread one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-id `COUNT`-style query.
  async fn count(&self, sql: &'static str, id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(id);
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, params![id_str], |row| row.get(0))?))
      .await?;
    Ok(decode_count(n))
  }

  async fn insert_location(&self, location: &Location) -> Result<()> {
    let id_str         = encode_uuid(location.location_id);
    let name           = location.name.clone();
    let description    = location.description.clone();
    let latitude       = location.coordinates.latitude;
    let longitude      = location.coordinates.longitude;
    let address        = location.address.clone();
    let image_urls_str = encode_strings(&location.image_urls)?;
    let tags_str       = encode_strings(&location.tags)?;
    let creator_str    = encode_uuid(location.creator_id);
    let created_str    = encode_dt(location.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO locations (
             location_id, name, description, latitude, longitude,
             address, image_urls, tags, creator_id, created_at, average_rating
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
          params![
            id_str,
            name,
            description,
            latitude,
            longitude,
            address,
            image_urls_str,
            tags_str,
            creator_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ActivityLedger impl ─────────────────────────────────────────────────────

impl ActivityLedger for SqliteStore {
  type Error = Error;

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, &id_str)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
    let UserUpdate { display_name, photo_url, points, badges } = update;
    let id_str     = encode_uuid(id);
    let points     = points.map(encode_points);
    let badges_str = badges.as_ref().map(encode_badges).transpose()?;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET
             display_name = COALESCE(?2, display_name),
             photo_url    = COALESCE(?3, photo_url),
             points       = COALESCE(?4, points),
             badges       = COALESCE(?5, badges)
           WHERE user_id = ?1",
          params![id_str, display_name, photo_url, points, badges_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(read_user(conn, &id_str)?)
      })
      .await?;

    raw.ok_or(Error::UserNotFound(id))?.into_user()
  }

  async fn count_locations_by_creator(&self, id: Uuid) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM locations WHERE creator_id = ?1", id)
      .await
  }

  async fn count_reviews_by_author(&self, id: Uuid) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM reviews WHERE author_id = ?1", id)
      .await
  }

  async fn count_photos_by_creator(&self, id: Uuid) -> Result<u64> {
    self
      .count(
        "SELECT COALESCE(SUM(json_array_length(image_urls)), 0)
         FROM locations WHERE creator_id = ?1",
        id,
      )
      .await
  }
}

// ─── GemStore impl ───────────────────────────────────────────────────────────

impl GemStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:                 Uuid::new_v4(),
      email:                   input.email,
      display_name:            input.display_name,
      photo_url:               input.photo_url,
      bookmarked_location_ids: Default::default(),
      points:                  0,
      badges:                  Default::default(),
      created_at:              Utc::now(),
    };

    let id_str     = encode_uuid(user.user_id);
    let email      = user.email.clone();
    let name       = user.display_name.clone();
    let photo_url  = user.photo_url.clone();
    let badges_str = encode_badges(&user.badges)?;
    let at_str     = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO users (user_id, email, display_name, photo_url, points, badges, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
          params![id_str, email, name, photo_url, badges_str, at_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(gems_core::Error::EmailTaken(user.email).into());
    }
    Ok(user)
  }

  async fn top_users(&self, limit: usize) -> Result<Vec<User>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users
           ORDER BY points DESC, created_at ASC
           LIMIT ?1"
        ))?;
        let mut rows = stmt
          .query_map(params![limit_val], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut rows {
          raw.bookmarks = read_bookmarks(conn, &raw.user_id)?;
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn toggle_bookmark(&self, user_id: Uuid, location_id: Uuid) -> Result<bool> {
    let user_str     = encode_uuid(user_id);
    let location_str = encode_uuid(location_id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !exists(&tx, "SELECT 1 FROM users WHERE user_id = ?1", &user_str)? {
          return Ok(Toggle::NoUser);
        }

        let removed = tx.execute(
          "DELETE FROM bookmarks WHERE user_id = ?1 AND location_id = ?2",
          params![user_str, location_str],
        )?;
        if removed > 0 {
          tx.commit()?;
          return Ok(Toggle::Done(false));
        }

        // Only new bookmarks need a live location.
        if !exists(&tx, "SELECT 1 FROM locations WHERE location_id = ?1", &location_str)? {
          return Ok(Toggle::NoLocation);
        }
        tx.execute(
          "INSERT INTO bookmarks (user_id, location_id) VALUES (?1, ?2)",
          params![user_str, location_str],
        )?;
        tx.commit()?;
        Ok(Toggle::Done(true))
      })
      .await?;

    match outcome {
      Toggle::NoUser => Err(Error::UserNotFound(user_id)),
      Toggle::NoLocation => Err(Error::LocationNotFound(location_id)),
      Toggle::Done(bookmarked) => Ok(bookmarked),
    }
  }

  async fn bookmarked_locations(&self, user_id: Uuid) -> Result<Vec<Location>> {
    let user_str = encode_uuid(user_id);

    let raws = self
      .conn
      .call(move |conn| {
        if !exists(conn, "SELECT 1 FROM users WHERE user_id = ?1", &user_str)? {
          return Ok(None);
        }
        let rows = query_locations(
          conn,
          &format!(
            "SELECT {LOCATION_COLUMNS} FROM locations
             WHERE location_id IN (SELECT location_id FROM bookmarks WHERE user_id = ?1)
             ORDER BY name"
          ),
          params![user_str],
        )?;
        Ok(Some(rows))
      })
      .await?;

    into_locations(raws.ok_or(Error::UserNotFound(user_id))?)
  }

  // ── Locations ─────────────────────────────────────────────────────────────

  async fn create_location(&self, input: NewLocation) -> Result<Location> {
    input.coordinates.validate()?;

    let location = Location {
      location_id:    Uuid::new_v4(),
      name:           input.name,
      description:    input.description,
      coordinates:    input.coordinates,
      address:        input.address,
      image_urls:     input.image_urls,
      tags:           input.tags,
      creator_id:     input.creator_id,
      created_at:     Utc::now(),
      average_rating: 0.0,
    };

    self.insert_location(&location).await?;
    Ok(location)
  }

  async fn get_location(&self, id: Uuid) -> Result<Option<Location>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE location_id = ?1"),
              params![id_str],
              RawLocation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLocation::into_location).transpose()
  }

  async fn search_locations(&self, query: &LocationQuery) -> Result<Vec<Location>> {
    let pattern = query
      .text
      .as_deref()
      .map(|t| format!("%{}%", escape_like(&t.trim().to_lowercase())));

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_locations(
          conn,
          &format!(
            "SELECT {LOCATION_COLUMNS} FROM locations
             WHERE ?1 IS NULL
                OR LOWER(name)        LIKE ?1 ESCAPE '\\'
                OR LOWER(description) LIKE ?1 ESCAPE '\\'
                OR EXISTS (
                  SELECT 1 FROM json_each(locations.tags)
                  WHERE LOWER(json_each.value) LIKE ?1 ESCAPE '\\'
                )
             ORDER BY name"
          ),
          params![pattern],
        )?)
      })
      .await?;

    let mut locations = into_locations(raws)?;
    if !query.tags.is_empty() {
      locations.retain(|l| query.tags.iter().all(|t| l.tags.contains(t)));
    }

    Ok(
      locations
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(100))
        .collect(),
    )
  }

  async fn locations_by_creator(&self, creator_id: Uuid) -> Result<Vec<Location>> {
    let creator_str = encode_uuid(creator_id);

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_locations(
          conn,
          &format!(
            "SELECT {LOCATION_COLUMNS} FROM locations
             WHERE creator_id = ?1
             ORDER BY created_at DESC, rowid DESC"
          ),
          params![creator_str],
        )?)
      })
      .await?;

    into_locations(raws)
  }

  async fn locations_within_box(&self, bbox: BoundingBox) -> Result<Vec<Location>> {
    let wraps = bbox.crosses_antimeridian();

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_locations(
          conn,
          &format!(
            "SELECT {LOCATION_COLUMNS} FROM locations
             WHERE latitude BETWEEN ?1 AND ?2
               AND ((?5 = 0 AND longitude BETWEEN ?3 AND ?4)
                 OR (?5 = 1 AND (longitude >= ?3 OR longitude <= ?4)))
             ORDER BY created_at, rowid"
          ),
          params![bbox.south, bbox.north, bbox.west, bbox.east, wraps],
        )?)
      })
      .await?;

    into_locations(raws)
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn add_review(&self, location_id: Uuid, input: NewReview) -> Result<Review> {
    input.validate()?;

    let review = Review {
      review_id:   Uuid::new_v4(),
      location_id,
      author_id:   input.author_id,
      rating:      input.rating,
      comment:     input.comment,
      created_at:  Utc::now(),
    };

    let review_str   = encode_uuid(review.review_id);
    let location_str = encode_uuid(location_id);
    let author_str   = encode_uuid(review.author_id);
    let rating       = review.rating;
    let comment      = review.comment.clone();
    let at_str       = encode_dt(review.created_at);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !exists(&tx, "SELECT 1 FROM locations WHERE location_id = ?1", &location_str)? {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO reviews (review_id, location_id, author_id, rating, comment, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![review_str, location_str, author_str, rating, comment, at_str],
        )?;

        let ratings = {
          let mut stmt = tx.prepare("SELECT rating FROM reviews WHERE location_id = ?1")?;
          stmt
            .query_map(params![location_str], |row| row.get::<_, u8>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute(
          "UPDATE locations SET average_rating = ?2 WHERE location_id = ?1",
          params![location_str, average_rating(&ratings)],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::LocationNotFound(location_id));
    }
    Ok(review)
  }

  async fn get_reviews(&self, location_id: Uuid) -> Result<Vec<Review>> {
    let location_str = encode_uuid(location_id);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE location_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(params![location_str], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  // ── Collections ───────────────────────────────────────────────────────────

  async fn create_collection(&self, input: NewCollection) -> Result<Collection> {
    let mut location_ids: Vec<Uuid> = Vec::with_capacity(input.location_ids.len());
    for id in input.location_ids {
      if !location_ids.contains(&id) {
        location_ids.push(id);
      }
    }

    let collection = Collection {
      collection_id: Uuid::new_v4(),
      name: input.name,
      description: input.description,
      creator_id: input.creator_id,
      location_ids,
      is_public: input.is_public,
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(collection.collection_id);
    let name        = collection.name.clone();
    let description = collection.description.clone();
    let creator_str = encode_uuid(collection.creator_id);
    let ids_str     = encode_uuids(&collection.location_ids)?;
    let is_public   = collection.is_public;
    let at_str      = encode_dt(collection.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO collections (
             collection_id, name, description, creator_id, location_ids, is_public, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![id_str, name, description, creator_str, ids_str, is_public, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(collection)
  }

  async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE collection_id = ?1"),
              params![id_str],
              RawCollection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCollection::into_collection).transpose()
  }

  async fn user_collections(&self, creator_id: Uuid) -> Result<Vec<Collection>> {
    let creator_str = encode_uuid(creator_id);

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_collections(
          conn,
          &format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE creator_id = ?1
             ORDER BY created_at DESC, rowid DESC"
          ),
          params![creator_str],
        )?)
      })
      .await?;

    into_collections(raws)
  }

  async fn public_collections(&self) -> Result<Vec<Collection>> {
    let raws = self
      .conn
      .call(|conn| {
        Ok(query_collections(
          conn,
          &format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE is_public = 1
             ORDER BY created_at DESC, rowid DESC"
          ),
          [],
        )?)
      })
      .await?;

    into_collections(raws)
  }

  async fn add_to_collection(&self, collection_id: Uuid, location_id: Uuid) -> Result<Collection> {
    let collection_str = encode_uuid(collection_id);
    let location_str   = encode_uuid(location_id);

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE collections
           SET location_ids = json_insert(location_ids, '$[#]', ?2)
           WHERE collection_id = ?1
             AND NOT EXISTS (SELECT 1 FROM json_each(location_ids) WHERE value = ?2)",
          params![collection_str, location_str],
        )?;
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE collection_id = ?1"),
              params![collection_str],
              RawCollection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(Error::CollectionNotFound(collection_id))?
      .into_collection()
  }
}
