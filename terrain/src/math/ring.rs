use dem::C;
use geo::geometry::Coord;

/// Even-odd ray casting test of `point` against a ring.
///
/// The ring may be open or closed. Points exactly on an edge may land
/// on either side.
pub fn ring_contains(ring: &[Coord<C>], point: Coord<C>) -> bool {
    let Coord { x, y } = point;
    let mut inside = false;
    let mut prev = match ring.last() {
        Some(last) => *last,
        None => return false,
    };
    for &curr in ring {
        if (curr.y > y) != (prev.y > y)
            && x < (prev.x - curr.x) * (y - curr.y) / (prev.y - curr.y) + curr.x
        {
            inside = !inside;
        }
        prev = curr;
    }
    inside
}
