//! Cut/fill earthwork volumes.

use crate::{
    math::{distance, polygon_area, ring_contains},
    sample_at, BasePlane, Method, Sample, TerrainError,
};
use dem::{DemData, C};
use geo::{
    algorithm::BoundingRect,
    geometry::{Coord, Polygon, Rect},
};
use log::debug;
use rayon::prelude::*;

/// Grid size used when none is given.
pub const DEFAULT_GRID_SIZE: usize = 50;

/// Earthwork volumes inside a polygon.
///
/// `fill_m3` is terrain above the base plane and `cut_m3` terrain
/// below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub cut_m3: C,
    pub fill_m3: C,
    /// Always `fill_m3 - cut_m3`.
    pub net_m3: C,
    pub base: BasePlane,
    pub method: Method,
    /// Area represented by each grid cell.
    pub cell_area_m2: C,
    /// Grid cells inside the polygon which resolved to an elevation.
    pub cells: usize,
    /// Area of the polygon's outer ring.
    pub area_m2: C,
}

impl Volume {
    pub fn builder() -> VolumeBuilder {
        VolumeBuilder {
            polygon: None,
            method: None,
            fixed_elevation: None,
            grid_size: DEFAULT_GRID_SIZE,
            bbox: None,
        }
    }
}

pub struct VolumeBuilder {
    /// Area to measure (required).
    polygon: Option<Polygon<C>>,

    /// Base plane method (required).
    method: Option<Method>,

    /// Base elevation for [`Method::FixedElevation`].
    fixed_elevation: Option<C>,

    /// Cells per side of the integration lattice.
    grid_size: usize,

    /// Precomputed bounding box of `polygon`.
    bbox: Option<Rect<C>>,
}

impl VolumeBuilder {
    /// Area to measure, in longitude/latitude (required).
    ///
    /// Only the exterior ring is considered.
    #[must_use]
    pub fn polygon(mut self, polygon: Polygon<C>) -> Self {
        self.polygon = Some(polygon);
        self
    }

    /// How to derive the base plane (required).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Base elevation, in meters (required for
    /// [`Method::FixedElevation`], ignored otherwise).
    #[must_use]
    pub fn fixed_elevation(mut self, meters: C) -> Self {
        self.fixed_elevation = Some(meters);
        self
    }

    /// Number of lattice cells per side (defaults to 50).
    #[must_use]
    pub fn grid_size(mut self, cells: usize) -> Self {
        self.grid_size = cells;
        self
    }

    /// Polygon bounding box, if the caller already has one (defaults
    /// to the exterior ring's bounding rect).
    #[must_use]
    pub fn bbox(mut self, bbox: Rect<C>) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn build(&self, dem: &DemData) -> Result<Volume, TerrainError> {
        let polygon = self.polygon.as_ref().ok_or(TerrainError::Builder("polygon"))?;
        let method = self.method.ok_or(TerrainError::Builder("method"))?;
        if method == Method::FixedElevation && self.fixed_elevation.is_none() {
            return Err(TerrainError::MissingFixedElevation);
        }
        let bbox = self
            .bbox
            .or_else(|| polygon.exterior().bounding_rect())
            .ok_or(TerrainError::Builder("polygon"))?;
        let grid = Grid::new(bbox, self.grid_size).ok_or(TerrainError::Builder("grid_size"))?;

        let ring = &polygon.exterior().0;
        let perimeter: Vec<Sample> = ring
            .iter()
            .filter_map(|&vertex| sample_at(dem, vertex))
            .collect();
        if perimeter.len() < 3 {
            return Err(TerrainError::InsufficientCoverage {
                found: perimeter.len(),
                required: 3,
            });
        }

        let base = BasePlane::fit(method, &perimeter, self.fixed_elevation)?;
        debug!(
            "volume; method: {method}, perimeter: {}/{}, base: {base:?}",
            perimeter.len(),
            ring.len()
        );

        let now = std::time::Instant::now();
        let tally = (0..grid.len())
            .into_par_iter()
            .filter_map(|idx| {
                let center = grid.center(idx);
                if !ring_contains(ring, center) {
                    return None;
                }
                let elevation = C::from(dem.get(center)?);
                let delta = elevation - base.elevation_at(dem.project(center));
                Some(Tally::from_delta(delta))
            })
            .reduce(Tally::default, Tally::merge);

        let cut_m3 = tally.cut * grid.cell_area_m2;
        let fill_m3 = tally.fill * grid.cell_area_m2;
        let volume = Volume {
            cut_m3,
            fill_m3,
            net_m3: fill_m3 - cut_m3,
            base,
            method,
            cell_area_m2: grid.cell_area_m2,
            cells: tally.cells,
            area_m2: polygon_area(ring),
        };

        debug!(
            "volume; cells: {}, cut_m3: {cut_m3}, fill_m3: {fill_m3}, exec: {:?}",
            volume.cells,
            now.elapsed()
        );

        Ok(volume)
    }
}

/// Regular lattice of cell centres over a bounding box.
struct Grid {
    origin: Coord<C>,
    step: Coord<C>,
    size: usize,
    len: usize,
    cell_area_m2: C,
}

impl Grid {
    /// Returns `None` for an empty lattice or one whose cell count
    /// overflows `usize`.
    fn new(bbox: Rect<C>, size: usize) -> Option<Self> {
        let len = size.checked_mul(size).filter(|&len| len > 0)?;
        let (min, max) = (bbox.min(), bbox.max());
        #[allow(clippy::cast_precision_loss)]
        let n = size as C;
        // Cells are small enough to treat as planar rectangles.
        let cell_width_m = distance(min, Coord { x: max.x, y: min.y }) * 1000.0 / n;
        let cell_height_m = distance(min, Coord { x: min.x, y: max.y }) * 1000.0 / n;
        Some(Self {
            origin: min,
            step: Coord {
                x: bbox.width() / n,
                y: bbox.height() / n,
            },
            size,
            len,
            cell_area_m2: cell_width_m * cell_height_m,
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    #[allow(clippy::cast_precision_loss)]
    fn center(&self, idx: usize) -> Coord<C> {
        let (col, row) = (idx % self.size, idx / self.size);
        Coord {
            x: self.origin.x + (col as C + 0.5) * self.step.x,
            y: self.origin.y + (row as C + 0.5) * self.step.y,
        }
    }
}

/// Per-cell (or partially reduced) elevation differences, in meters.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    cut: C,
    fill: C,
    cells: usize,
}

impl Tally {
    fn from_delta(delta: C) -> Self {
        if delta > 0.0 {
            Self {
                cut: 0.0,
                fill: delta,
                cells: 1,
            }
        } else {
            Self {
                cut: -delta,
                fill: 0.0,
                cells: 1,
            }
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            cut: self.cut + other.cut,
            fill: self.fill + other.fill,
            cells: self.cells + other.cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, Volume};
    use crate::{fixtures::unit_dem, BasePlane, Method, TerrainError};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use dem::{DemData, Elev};
    use geo::{coord, polygon, Coord, Polygon, Rect};

    fn square() -> Polygon {
        polygon![
            (x: 0.2, y: 0.2),
            (x: 0.8, y: 0.2),
            (x: 0.8, y: 0.8),
            (x: 0.2, y: 0.8),
            (x: 0.2, y: 0.2),
        ]
    }

    fn flat() -> DemData {
        unit_dem(10, |_, _| 50.0)
    }

    /// 55 m inside columns/rows 3..=7, 50 m elsewhere, so the square's
    /// vertices sample 50 m and much of its interior 55 m.
    fn mound(height: Elev) -> DemData {
        let inner = 3..=7;
        unit_dem(10, move |col, row| {
            if inner.contains(&col) && inner.contains(&row) {
                height
            } else {
                50.0
            }
        })
    }

    fn volume(dem: &DemData, method: Method) -> Volume {
        Volume::builder()
            .polygon(square())
            .method(method)
            .fixed_elevation(50.0)
            .build(dem)
            .unwrap()
    }

    #[test]
    fn test_flat_terrain_every_method() {
        let dem = flat();
        for method in Method::ALL {
            let volume = volume(&dem, method);
            assert_eq!(volume.method, method);
            assert_abs_diff_eq!(volume.cut_m3, 0.0, epsilon = 1.0);
            assert_abs_diff_eq!(volume.fill_m3, 0.0, epsilon = 1.0);
            assert_abs_diff_eq!(volume.net_m3, 0.0, epsilon = 1.0);
            assert!(volume.cells > 0);
        }
    }

    #[test]
    fn test_flat_terrain_base_elevation() {
        let dem = flat();
        for method in [Method::LowestPoint, Method::AveragePerimeter] {
            let volume = volume(&dem, method);
            assert_eq!(volume.base, BasePlane::Flat { elevation: 50.0 });
            assert_eq!(volume.cut_m3, 0.0);
            assert_eq!(volume.fill_m3, 0.0);
            assert_eq!(volume.net_m3, 0.0);
        }
    }

    #[test]
    fn test_mound_is_fill() {
        let volume = volume(&mound(55.0), Method::LowestPoint);
        assert_eq!(volume.base, BasePlane::Flat { elevation: 50.0 });
        assert!(volume.fill_m3 > 0.0);
        assert_eq!(volume.cut_m3, 0.0);
        assert_eq!(volume.net_m3, volume.fill_m3);
    }

    #[test]
    fn test_pit_is_cut() {
        let volume = volume(&mound(45.0), Method::AveragePerimeter);
        assert!(volume.cut_m3 > 0.0);
        assert_eq!(volume.fill_m3, 0.0);
        assert_eq!(volume.net_m3, -volume.cut_m3);
    }

    #[test]
    fn test_net_is_fill_minus_cut() {
        let dem = unit_dem(10, |col, row| (col * 7 + row * 3) as Elev);
        for method in Method::ALL {
            let volume = volume(&dem, method);
            assert_eq!(volume.net_m3, volume.fill_m3 - volume.cut_m3);
            assert!(volume.cut_m3 >= 0.0 && volume.fill_m3 >= 0.0);
        }
    }

    #[test]
    fn test_fixed_elevation() {
        let volume = Volume::builder()
            .polygon(square())
            .method(Method::FixedElevation)
            .fixed_elevation(49.0)
            .build(&flat())
            .unwrap();
        assert_eq!(volume.base, BasePlane::Flat { elevation: 49.0 });
        assert_eq!(volume.cut_m3, 0.0);
        assert_relative_eq!(
            volume.fill_m3,
            volume.cells as f64 * volume.cell_area_m2,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_missing_fixed_elevation_precedes_sampling() {
        // Polygon is entirely off the raster, yet the argument error
        // wins.
        let far: Polygon = polygon![
            (x: 10.0, y: 10.0),
            (x: 11.0, y: 10.0),
            (x: 11.0, y: 11.0),
            (x: 10.0, y: 10.0),
        ];
        let result = Volume::builder()
            .polygon(far)
            .method(Method::FixedElevation)
            .build(&flat());
        assert!(matches!(result, Err(TerrainError::MissingFixedElevation)));
    }

    #[test]
    fn test_insufficient_perimeter() {
        // Only the first vertex, and the closing copy of it, land on
        // the raster.
        let straddling: Polygon = polygon![
            (x: 0.5, y: 0.5),
            (x: 1.5, y: 0.5),
            (x: 1.5, y: 1.5),
            (x: 0.5, y: 0.5),
        ];
        let result = Volume::builder()
            .polygon(straddling)
            .method(Method::LowestPoint)
            .build(&flat());
        assert!(matches!(
            result,
            Err(TerrainError::InsufficientCoverage {
                found: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn test_closing_vertex_counts_toward_coverage() {
        // Third vertex is off the raster; the first is sampled twice.
        let straddling: Polygon = polygon![
            (x: 0.5, y: 0.5),
            (x: 0.9, y: 0.5),
            (x: 1.5, y: 1.5),
            (x: 0.5, y: 0.5),
        ];
        let volume = Volume::builder()
            .polygon(straddling)
            .method(Method::LowestPoint)
            .build(&flat())
            .unwrap();
        assert_eq!(volume.base, BasePlane::Flat { elevation: 50.0 });
    }

    #[test]
    fn test_closing_vertex_weights_average() {
        let dem = unit_dem(10, |col, _| 10.0 * col as Elev);
        let triangle: Polygon = polygon![
            (x: 0.15, y: 0.2),
            (x: 0.25, y: 0.2),
            (x: 0.65, y: 0.8),
            (x: 0.15, y: 0.2),
        ];
        let volume = Volume::builder()
            .polygon(triangle)
            .method(Method::AveragePerimeter)
            .build(&dem)
            .unwrap();
        // (10 + 20 + 60 + 10) / 4
        assert_eq!(volume.base, BasePlane::Flat { elevation: 25.0 });
    }

    #[test]
    fn test_degenerate_best_fit() {
        let sliver: Polygon = polygon![
            (x: 0.2, y: 0.2),
            (x: 0.5, y: 0.5),
            (x: 0.8, y: 0.8),
            (x: 0.2, y: 0.2),
        ];
        let result = Volume::builder()
            .polygon(sliver)
            .method(Method::BestFit)
            .build(&flat());
        assert!(matches!(result, Err(TerrainError::DegenerateFit { .. })));
    }

    #[test]
    fn test_best_fit_follows_slope() {
        // 10 m per column, west to east.
        let dem = unit_dem(10, |col, _| 10.0 * col as Elev);
        let volume = volume(&dem, Method::BestFit);
        let BasePlane::Tilted { a, b, c } = volume.base else {
            panic!("expected tilted plane, got {:?}", volume.base);
        };
        // Vertices at x = 0.2 sample 20 m, at x = 0.8 sample 80 m.
        assert_relative_eq!(a, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c, 0.0, epsilon = 1e-9);
        // Stepped terrain sits at or below the ramp through it.
        assert!(volume.cut_m3 > 0.0);
        assert!(volume.fill_m3 < volume.cut_m3);
    }

    #[test]
    fn test_projected_raster() {
        // Same flat raster, but stored in a "metre" grid at 1000x.
        let native = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1000.0, y: 1000.0));
        let wgs84 = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 1.0));
        let dem = DemData::new(vec![50.0; 100], 10, 10, native, wgs84)
            .unwrap()
            .with_projection(|Coord { x, y }: Coord<f64>| Coord {
                x: x * 1000.0,
                y: y * 1000.0,
            });
        let projected = volume(&dem, Method::LowestPoint);
        let geographic = volume(&flat(), Method::LowestPoint);
        assert_eq!(projected.cells, geographic.cells);
        assert_eq!(projected.net_m3, 0.0);
    }

    /// `side` x `side` raster over [0, 0, 1, 1] in WGS84, stored in a
    /// native grid scaled 1000x.
    fn projected_dem(side: usize, f: impl Fn(usize, usize) -> Elev) -> DemData {
        let native = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1000.0, y: 1000.0));
        let wgs84 = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 1.0));
        let values: Vec<Elev> = (0..side)
            .flat_map(|row| (0..side).map(move |col| (col, row)))
            .map(|(col, row)| f(col, row))
            .collect();
        DemData::new(values, side, side, native, wgs84)
            .unwrap()
            .with_projection(|Coord { x, y }: Coord<f64>| Coord {
                x: x * 1000.0,
                y: y * 1000.0,
            })
    }

    #[test]
    fn test_projected_best_fit_uses_native_units() {
        let ramp = |col: usize, _: usize| 10.0 * col as Elev;
        let projected = volume(&projected_dem(10, ramp), Method::BestFit);
        let BasePlane::Tilted { a, b, c } = projected.base else {
            panic!("expected tilted plane, got {:?}", projected.base);
        };
        // 60 m over 600 native units, not 60 m over 0.6 degrees.
        assert_relative_eq!(a, 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(b, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c, 0.0, epsilon = 1e-6);

        let geographic = volume(&unit_dem(10, ramp), Method::BestFit);
        assert_eq!(projected.cells, geographic.cells);
        assert_relative_eq!(projected.cut_m3, geographic.cut_m3, max_relative = 1e-9);
        assert_abs_diff_eq!(projected.fill_m3, geographic.fill_m3, epsilon = 1.0);
    }

    #[test]
    fn test_projected_flat_best_fit() {
        let volume = volume(&projected_dem(10, |_, _| 50.0), Method::BestFit);
        assert_abs_diff_eq!(
            volume.base.elevation_at(coord!(x: 500.0, y: 500.0)),
            50.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(volume.cut_m3, 0.0, epsilon = 1.0);
        assert_abs_diff_eq!(volume.fill_m3, 0.0, epsilon = 1.0);
    }

    #[test]
    fn test_caller_bbox() {
        let dem = flat();
        let full = volume(&dem, Method::LowestPoint);
        let partial = Volume::builder()
            .polygon(square())
            .method(Method::LowestPoint)
            .bbox(Rect::new(coord!(x: 0.2, y: 0.2), coord!(x: 0.5, y: 0.5)))
            .build(&dem)
            .unwrap();
        assert_eq!(full.cells, 50 * 50);
        assert_eq!(partial.cells, 50 * 50);
        assert!(partial.cell_area_m2 < full.cell_area_m2);
    }

    #[test]
    fn test_missing_parameters() {
        let dem = flat();
        assert!(matches!(
            Volume::builder().method(Method::BestFit).build(&dem),
            Err(TerrainError::Builder("polygon"))
        ));
        assert!(matches!(
            Volume::builder().polygon(square()).build(&dem),
            Err(TerrainError::Builder("method"))
        ));
        assert!(matches!(
            Volume::builder()
                .polygon(square())
                .method(Method::BestFit)
                .grid_size(0)
                .build(&dem),
            Err(TerrainError::Builder("grid_size"))
        ));
        assert!(matches!(
            Volume::builder()
                .polygon(square())
                .method(Method::BestFit)
                .grid_size(usize::MAX)
                .build(&dem),
            Err(TerrainError::Builder("grid_size"))
        ));
    }

    #[test]
    fn test_grid() {
        let bbox = Rect::new(coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 2.0));
        let grid = Grid::new(bbox, 4).unwrap();
        assert_eq!(grid.len(), 16);
        assert_eq!(grid.center(0), coord!(x: 0.125, y: 0.25));
        assert_eq!(grid.center(15), coord!(x: 0.875, y: 1.75));
        assert!(grid.cell_area_m2 > 0.0);
        assert!(Grid::new(bbox, 0).is_none());
        assert!(Grid::new(bbox, usize::MAX).is_none());
    }

    #[test]
    fn test_area() {
        let volume = volume(&flat(), Method::LowestPoint);
        assert_relative_eq!(
            volume.area_m2,
            crate::math::polygon_area(&square().exterior().0)
        );
        assert!(volume.area_m2 > volume.cell_area_m2 * volume.cells as f64 * 0.9);
    }
}
