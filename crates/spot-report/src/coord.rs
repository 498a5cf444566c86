/// Report locations and the grid-reference conversion seam.
use serde::{Deserialize, Serialize};

use crate::{Error, SRResult};

//  _____
// |_   _|   _ _ __   ___  ___
//   | || | | | '_ \ / _ \/ __|
//   | || |_| | |_) |  __/\__ \
//   |_| \__, | .__/ \___||___/
//       |___/|_|

/// Well-known ID of WGS 84 geographic coordinates (x = longitude, y = latitude).
pub const WKID_WGS84: u32 = 4326;

/// Well-known ID of Web Mercator, the usual basemap projection.
pub const WKID_WEB_MERCATOR: u32 = 3857;

/// A point in some spatial reference, identified by its well-known ID.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub wkid: u32,
}

impl Location {
    pub fn new(x: f64, y: f64, wkid: u32) -> Self {
        Self { x, y, wkid }
    }

    /// WGS 84 location from longitude / latitude in degrees, range checked.
    pub fn wgs84(lon: f64, lat: f64) -> SRResult<Self> {
        validate_lat(lat)?;
        validate_lon(lon)?;
        Ok(Self::new(lon, lat, WKID_WGS84))
    }

    /// Control points as carried in a Geomessage: `x,y` with no rounding.
    pub fn control_points(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

fn validate_lat(lat: f64) -> SRResult<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidCoord(format!("latitude {lat}")));
    }
    Ok(())
}

fn validate_lon(lon: f64) -> SRResult<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidCoord(format!("longitude {lon}")));
    }
    Ok(())
}

/// Converts a point to a military grid reference string (e.g. MGRS).
///
/// This is the map controller's job; the sender only asks for the string.
pub trait GridReference {
    fn point_to_grid_reference(&self, x: f64, y: f64, wkid: u32) -> SRResult<String>;
}

impl<F> GridReference for F
where
    F: Fn(f64, f64, u32) -> SRResult<String>,
{
    fn point_to_grid_reference(&self, x: f64, y: f64, wkid: u32) -> SRResult<String> {
        self(x, y, wkid)
    }
}
