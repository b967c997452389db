use crate::math::distance;
use dem::{DemData, C};
use geo::geometry::Coord;
use log::trace;

/// A coordinate that resolved to an elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Query location in WGS84.
    pub lonlat: Coord<C>,

    /// Query location in the raster's native coordinate space.
    pub projected: Coord<C>,

    /// Elevation of the containing cell.
    pub elevation: C,
}

/// Samples `dem` at `lonlat`, keeping the projected location.
pub fn sample_at(dem: &DemData, lonlat: Coord<C>) -> Option<Sample> {
    match dem.try_get_projected(lonlat) {
        Ok((projected, elevation)) => Some(Sample {
            lonlat,
            projected,
            elevation: C::from(elevation),
        }),
        Err(e) => {
            trace!("{e}");
            None
        }
    }
}

/// Returns the approximate (width, height) of one raster cell in
/// meters, measured across the middle of the raster's WGS84 extent.
pub fn cell_size_m(dem: &DemData) -> (C, C) {
    let bbox = dem.wgs84_bbox();
    let (min, max, mid) = (bbox.min(), bbox.max(), bbox.center());
    let width_km = distance(Coord { x: min.x, y: mid.y }, Coord { x: max.x, y: mid.y });
    let height_km = distance(Coord { x: mid.x, y: min.y }, Coord { x: mid.x, y: max.y });
    #[allow(clippy::cast_precision_loss)]
    let cell = (
        width_km * 1000.0 / dem.width() as C,
        height_km * 1000.0 / dem.height() as C,
    );
    cell
}
