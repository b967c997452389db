//! Digital elevation model rasters.
//!
//! A [`DemData`] is an immutable, fully resident snapshot of a raster
//! surface. Lookups are nearest-cell: a query resolves to the single
//! cell containing it and returns that cell's value verbatim.
//!
//! Rasters may live in any planar coordinate space. Queries are always
//! made in WGS84 longitude/latitude and pushed through an optional
//! [`Projection`] before indexing.

mod error;
mod hgt;

pub use crate::error::{DemError, SampleError};
use geo::geometry::{Coord, Rect};
use log::trace;
use std::fmt;

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Representation of elevation samples.
pub type Elev = f32;

/// Forward transform from WGS84 longitude/latitude to a raster's
/// native coordinate space.
///
/// Any `Fn(Coord) -> Coord` closure is a projection.
pub trait Projection: Send + Sync {
    fn forward(&self, lonlat: Coord<C>) -> Coord<C>;
}

impl<F> Projection for F
where
    F: Fn(Coord<C>) -> Coord<C> + Send + Sync,
{
    fn forward(&self, lonlat: Coord<C>) -> Coord<C> {
        self(lonlat)
    }
}

pub struct DemData {
    /// Row-major samples, row 0 is the northern edge.
    values: Box<[Elev]>,

    /// Number of columns.
    width: usize,

    /// Number of rows.
    height: usize,

    /// Extent in the raster's native coordinate space.
    bbox: Rect<C>,

    /// The same extent in WGS84.
    wgs84_bbox: Rect<C>,

    /// Sentinel marking cells without elevation.
    no_data: Option<Elev>,

    /// `None` means the raster is already geographic.
    projection: Option<Box<dyn Projection>>,
}

impl DemData {
    /// Returns a raster covering `bbox` natively and `wgs84_bbox` in
    /// geographic coordinates.
    pub fn new(
        values: impl Into<Box<[Elev]>>,
        width: usize,
        height: usize,
        bbox: Rect<C>,
        wgs84_bbox: Rect<C>,
    ) -> Result<Self, DemError> {
        let values = values.into();
        if width == 0 || height == 0 || width.checked_mul(height) != Some(values.len()) {
            return Err(DemError::Dimensions {
                width,
                height,
                len: values.len(),
            });
        }
        if is_degenerate(&bbox) {
            return Err(DemError::Extent("native"));
        }
        if is_degenerate(&wgs84_bbox) {
            return Err(DemError::Extent("WGS84"));
        }
        Ok(Self {
            values,
            width,
            height,
            bbox,
            wgs84_bbox,
            no_data: None,
            projection: None,
        })
    }

    /// Returns a raster whose native space is WGS84.
    pub fn geographic(
        values: impl Into<Box<[Elev]>>,
        width: usize,
        height: usize,
        bbox: Rect<C>,
    ) -> Result<Self, DemError> {
        Self::new(values, width, height, bbox, bbox)
    }

    #[must_use]
    pub fn with_no_data(mut self, no_data: Elev) -> Self {
        self.no_data = Some(no_data);
        self
    }

    #[must_use]
    pub fn with_projection<P>(mut self, projection: P) -> Self
    where
        P: Projection + 'static,
    {
        self.projection = Some(Box::new(projection));
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bbox(&self) -> Rect<C> {
        self.bbox
    }

    pub fn wgs84_bbox(&self) -> Rect<C> {
        self.wgs84_bbox
    }

    pub fn no_data(&self) -> Option<Elev> {
        self.no_data
    }

    pub fn is_projected(&self) -> bool {
        self.projection.is_some()
    }

    /// Returns `lonlat` in the raster's native coordinate space.
    pub fn project(&self, lonlat: Coord<C>) -> Coord<C> {
        match &self.projection {
            Some(projection) => projection.forward(lonlat),
            None => lonlat,
        }
    }

    /// Returns the elevation of the cell containing `lonlat`.
    pub fn try_get(&self, lonlat: Coord<C>) -> Result<Elev, SampleError> {
        self.try_get_projected(lonlat).map(|(_, elevation)| elevation)
    }

    /// Returns `lonlat` in native coordinates along with the elevation
    /// of the cell containing it.
    ///
    /// The projection runs once per call.
    pub fn try_get_projected(&self, lonlat: Coord<C>) -> Result<(Coord<C>, Elev), SampleError> {
        if !contains(&self.wgs84_bbox, lonlat) {
            return Err(SampleError::OutOfExtent(lonlat));
        }
        let projected = self.project(lonlat);
        if !contains(&self.bbox, projected) {
            return Err(SampleError::OutOfExtent(lonlat));
        }
        let xy = self
            .coord_to_xy(projected)
            .ok_or(SampleError::OutOfExtent(lonlat))?;
        let elevation = self.values[self.xy_to_linear_index(xy)];
        if self.is_no_data(elevation) {
            Err(SampleError::NoData(lonlat))
        } else {
            Ok((projected, elevation))
        }
    }

    /// Returns the elevation of the cell containing `lonlat`, if any.
    pub fn get(&self, lonlat: Coord<C>) -> Option<Elev> {
        match self.try_get(lonlat) {
            Ok(elevation) => Some(elevation),
            Err(e) => {
                trace!("{e}");
                None
            }
        }
    }

    /// Returns the raw cell value at column `x`, row `y`.
    pub fn get_xy(&self, (x, y): (usize, usize)) -> Option<Elev> {
        if x < self.width && y < self.height {
            Some(self.values[self.xy_to_linear_index((x, y))])
        } else {
            None
        }
    }

    /// Returns the lowest valid sample in this raster.
    pub fn min_elevation(&self) -> Option<Elev> {
        self.valid().reduce(Elev::min)
    }

    /// Returns the highest valid sample in this raster.
    pub fn max_elevation(&self) -> Option<Elev> {
        self.valid().reduce(Elev::max)
    }
}

/// Private API
impl DemData {
    fn is_no_data(&self, elevation: Elev) -> bool {
        elevation.is_nan() || self.no_data == Some(elevation)
    }

    fn valid(&self) -> impl Iterator<Item = Elev> + '_ {
        self.values
            .iter()
            .copied()
            .filter(move |elev| !self.is_no_data(*elev))
    }

    /// Maps a native coordinate to (column, row), row 0 being north.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn coord_to_xy(&self, Coord { x, y }: Coord<C>) -> Option<(usize, usize)> {
        let min = self.bbox.min();
        let max = self.bbox.max();
        let x_pct = (x - min.x) / (max.x - min.x);
        let y_pct = (max.y - y) / (max.y - min.y);
        let (idx_x, idx_y) = (
            (x_pct * self.width as C).floor() as isize,
            (y_pct * self.height as C).floor() as isize,
        );
        if 0 <= idx_x
            && idx_x < self.width as isize
            && 0 <= idx_y
            && idx_y < self.height as isize
        {
            Some((idx_x as usize, idx_y as usize))
        } else {
            None
        }
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.width * y + x
    }
}

impl fmt::Debug for DemData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bbox", &self.bbox)
            .field("wgs84_bbox", &self.wgs84_bbox)
            .field("no_data", &self.no_data)
            .field("projected", &self.projection.is_some())
            .finish_non_exhaustive()
    }
}

fn contains(rect: &Rect<C>, Coord { x, y }: Coord<C>) -> bool {
    let min = rect.min();
    let max = rect.max();
    min.x <= x && x <= max.x && min.y <= y && y <= max.y
}

fn is_degenerate(rect: &Rect<C>) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}
