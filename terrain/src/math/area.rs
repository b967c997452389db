use dem::C;
use geo::geometry::Coord;

const EARTH_RADIUS_M: C = super::EARTH_RADIUS_KM * 1000.0;

/// Returns the approximate area, in m², enclosed by a
/// longitude/latitude ring.
///
/// Spherical excess approximation; good for small to regional
/// polygons, not for ones spanning a hemisphere. Winding order does
/// not matter. Rings with fewer than three vertices have no area.
pub fn polygon_area(ring: &[Coord<C>]) -> C {
    if ring.len() < 3 {
        return 0.0;
    }
    let sum: C = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(p1, p2)| {
            (p2.x - p1.x).to_radians() * (2.0 + p1.y.to_radians().sin() + p2.y.to_radians().sin())
        })
        .sum();
    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}
