use dem::C;
use geo::geometry::Coord;

/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: C = 6371.0;

/// Returns the great-circle distance, in kilometers, between two
/// longitude/latitude coordinates.
pub fn distance(a: Coord<C>, b: Coord<C>) -> C {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let d_lat = (b.y - a.y).to_radians();
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Returns the summed great-circle length, in kilometers, of a path.
pub fn line_length(coords: &[Coord<C>]) -> C {
    coords
        .windows(2)
        .map(|segment| distance(segment[0], segment[1]))
        .sum()
}
