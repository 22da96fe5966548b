//! Shared argument types and value parsers.

use clap::Args;
use walknet_lib::{Coordinate, RoutePreferences};

/// Parse a `LAT,LON` pair in decimal degrees.
pub fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{value}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(format!("coordinate {lat},{lon} is out of range"));
    }
    Ok(coordinate)
}

/// Routing preference switches shared by `route` and `loop`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PreferenceArgs {
    /// Favor links through parks.
    #[arg(long)]
    pub prefer_park: bool,
    /// Penalize pedestrian overpasses.
    #[arg(long)]
    pub avoid_overpass: bool,
    /// Penalize tunnels and underpasses.
    #[arg(long)]
    pub avoid_tunnel: bool,
    /// Favor indoor links through buildings.
    #[arg(long)]
    pub prefer_indoor: bool,
}

impl PreferenceArgs {
    pub fn to_preferences(self) -> RoutePreferences {
        RoutePreferences {
            prefer_park: self.prefer_park,
            avoid_overpass: self.avoid_overpass,
            avoid_tunnel: self.avoid_tunnel,
            prefer_indoor: self.prefer_indoor,
        }
    }
}
