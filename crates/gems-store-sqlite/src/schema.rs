//! SQL schema for the Local Gems SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    photo_url    TEXT,
    points       INTEGER NOT NULL DEFAULT 0,
    badges       TEXT NOT NULL DEFAULT '[]',   -- JSON array of badge ids
    created_at   TEXT NOT NULL
);

-- creator_id is not a foreign key.
CREATE TABLE IF NOT EXISTS locations (
    location_id    TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL,
    latitude       REAL NOT NULL CHECK (latitude  BETWEEN -90  AND 90),
    longitude      REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    address        TEXT NOT NULL DEFAULT '',
    image_urls     TEXT NOT NULL DEFAULT '[]',
    tags           TEXT NOT NULL DEFAULT '[]',
    creator_id     TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    average_rating REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    location_id TEXT NOT NULL REFERENCES locations(location_id),
    author_id   TEXT NOT NULL,
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

-- location_id is not a foreign key; deleting a location leaves bookmarks.
CREATE TABLE IF NOT EXISTS bookmarks (
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    location_id TEXT NOT NULL,
    PRIMARY KEY (user_id, location_id)
);

-- Ordered JSON array of location ids, unlinked from the locations table.
CREATE TABLE IF NOT EXISTS collections (
    collection_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    creator_id    TEXT NOT NULL,
    location_ids  TEXT NOT NULL DEFAULT '[]',
    is_public     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_points_idx        ON users(points);
CREATE INDEX IF NOT EXISTS locations_position_idx  ON locations(latitude, longitude);
CREATE INDEX IF NOT EXISTS locations_creator_idx   ON locations(creator_id);
CREATE INDEX IF NOT EXISTS reviews_location_idx    ON reviews(location_id);
CREATE INDEX IF NOT EXISTS reviews_author_idx      ON reviews(author_id);
CREATE INDEX IF NOT EXISTS collections_creator_idx ON collections(creator_id);

PRAGMA user_version = 1;
";
