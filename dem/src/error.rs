use crate::C;
use geo::geometry::Coord;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("{len} values do not fill a {width}x{height} grid")]
    Dimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("degenerate {0} extent")]
    Extent(&'static str),
}

/// Reasons a coordinate has no elevation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    #[error("{0:?} is outside the raster extent")]
    OutOfExtent(Coord<C>),

    #[error("no data at {0:?}")]
    NoData(Coord<C>),
}
