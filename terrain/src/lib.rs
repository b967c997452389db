//! Terrain analysis over in-memory digital elevation models.
//!
//! Everything here is a pure function of a [`dem::DemData`] and a
//! geometry: elevation profiles along lines and cut/fill volumes
//! inside polygons.

mod error;
pub mod math;
mod plane;
mod profile;
mod sampler;
mod volume;

pub use crate::{
    error::TerrainError,
    plane::{BasePlane, Method},
    profile::{Profile, ProfileBuilder, ProfileSample},
    sampler::{cell_size_m, sample_at, Sample},
    volume::{Volume, VolumeBuilder},
};
pub use {dem, geo};
