//! Coordinates, great-circle distance, and radius search.
//!
//! Distances are in kilometres on a sphere of mean Earth radius. The
//! bounding box is a coarse pre-filter for storage queries; inclusion is
//! always decided by [`haversine_km`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result, location::Location};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Rough length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Slack applied to the `distance <= radius` comparison.
pub const DISTANCE_TOLERANCE_KM: f64 = 1e-6;

// ─── Coordinates ─────────────────────────────────────────────────────────────

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  /// Build a validated coordinate pair.
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    let coords = Self { latitude, longitude };
    coords.validate()?;
    Ok(coords)
  }

  /// Reject latitudes outside [-90, 90] and longitudes outside [-180, 180].
  /// NaN fails both ranges.
  pub fn validate(&self) -> Result<()> {
    if (-90.0..=90.0).contains(&self.latitude)
      && (-180.0..=180.0).contains(&self.longitude)
    {
      Ok(())
    } else {
      Err(Error::InvalidCoordinate {
        latitude:  self.latitude,
        longitude: self.longitude,
      })
    }
  }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
  let d_lat = (b.latitude - a.latitude).to_radians();
  let d_lon = (b.longitude - a.longitude).to_radians();
  let h = ((d_lat / 2.0).sin().powi(2)
    + a.latitude.to_radians().cos()
      * b.latitude.to_radians().cos()
      * (d_lon / 2.0).sin().powi(2))
  .clamp(0.0, 1.0);
  2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

fn validate_radius(radius_km: f64) -> Result<()> {
  if radius_km.is_finite() && radius_km >= 0.0 {
    Ok(())
  } else {
    Err(Error::InvalidRadius(radius_km))
  }
}

// ─── Bounding box ────────────────────────────────────────────────────────────

/// A rectangular lat/lng envelope.
///
/// `west > east` means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub north: f64,
  pub south: f64,
  pub east:  f64,
  pub west:  f64,
}

impl BoundingBox {
  pub fn crosses_antimeridian(&self) -> bool { self.west > self.east }

  pub fn contains(&self, c: Coordinates) -> bool {
    let in_lat = c.latitude >= self.south && c.latitude <= self.north;
    let in_lng = if self.crosses_antimeridian() {
      c.longitude >= self.west || c.longitude <= self.east
    } else {
      c.longitude >= self.west && c.longitude <= self.east
    };
    in_lat && in_lng
  }
}

fn wrap_longitude(lng: f64) -> f64 {
  if lng > 180.0 {
    lng - 360.0
  } else if lng < -180.0 {
    lng + 360.0
  } else {
    lng
  }
}

/// Envelope around `center` that contains every point within `radius_km`.
///
/// Latitude uses 111 km per degree. The longitude half-width is the larger
/// of `r / (111 cos(lat))` and the exact great-circle reach
/// `asin(sin(r / R) / cos(lat))`. If the circle reaches a pole the box spans
/// all longitudes.
pub fn bounding_box(center: Coordinates, radius_km: f64) -> Result<BoundingBox> {
  center.validate()?;
  validate_radius(radius_km)?;

  let reach_km = radius_km + DISTANCE_TOLERANCE_KM;
  let lat_offset = reach_km / KM_PER_DEGREE;
  let north = center.latitude + lat_offset;
  let south = center.latitude - lat_offset;

  if north >= 90.0 || south <= -90.0 {
    return Ok(BoundingBox {
      north: north.min(90.0),
      south: south.max(-90.0),
      east:  180.0,
      west:  -180.0,
    });
  }

  let cos_lat = center.latitude.to_radians().cos();
  let ratio = (reach_km / EARTH_RADIUS_KM).sin() / cos_lat;
  if !ratio.is_finite() || ratio >= 1.0 {
    return Ok(BoundingBox { north, south, east: 180.0, west: -180.0 });
  }
  let lng_offset = ratio
    .asin()
    .to_degrees()
    .max(reach_km / (KM_PER_DEGREE * cos_lat));

  if lng_offset >= 180.0 {
    return Ok(BoundingBox { north, south, east: 180.0, west: -180.0 });
  }

  Ok(BoundingBox {
    north,
    south,
    east: wrap_longitude(center.longitude + lng_offset),
    west: wrap_longitude(center.longitude - lng_offset),
  })
}

// ─── Radius filter ───────────────────────────────────────────────────────────

/// A location paired with its distance from the search center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nearby {
  pub location:    Location,
  pub distance_km: f64,
  /// Human-readable distance, see [`format_distance`].
  pub distance:    String,
}

/// Keep the candidates within `radius_km` of `center`, in input order.
pub fn nearby<I>(center: Coordinates, radius_km: f64, candidates: I) -> Result<Vec<Nearby>>
where
  I: IntoIterator<Item = Location>,
{
  center.validate()?;
  validate_radius(radius_km)?;

  Ok(
    candidates
      .into_iter()
      .filter_map(|location| {
        let distance_km = haversine_km(center, location.coordinates);
        (distance_km <= radius_km + DISTANCE_TOLERANCE_KM).then(|| Nearby {
          distance: format_distance(distance_km),
          location,
          distance_km,
        })
      })
      .collect(),
  )
}

/// Like [`nearby`], without the distance annotations.
pub fn within_radius<I>(
  center: Coordinates,
  radius_km: f64,
  candidates: I,
) -> Result<Vec<Location>>
where
  I: IntoIterator<Item = Location>,
{
  Ok(
    nearby(center, radius_km, candidates)?
      .into_iter()
      .map(|n| n.location)
      .collect(),
  )
}

/// `"350m"` below one kilometre, `"2.4km"` otherwise.
pub fn format_distance(distance_km: f64) -> String {
  if distance_km < 1.0 {
    format!("{}m", (distance_km * 1000.0).round() as u64)
  } else {
    format!("{distance_km:.1}km")
  }
}
