use crate::{
    math::{distance, line_length},
    TerrainError,
};
use dem::{DemData, C};
use geo::geometry::{Coord, LineString, Point};
use log::debug;

/// Sample budget used when none is given.
pub const DEFAULT_SAMPLE_BUDGET: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Along-path distance of each sample from the start of the path,
    /// in meters.
    pub distances_m: Vec<C>,

    /// Location of each sample.
    pub path: Vec<Point<C>>,

    /// Elevation at each sample.
    pub terrain_elev_m: Vec<C>,
}

/// One (distance, elevation) pair of a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    pub distance_m: C,
    pub elevation_m: C,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            path: None,
            sample_budget: DEFAULT_SAMPLE_BUDGET,
        }
    }

    /// Returns the number of samples in this profile (at least 2).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.distances_m.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = ProfileSample> + '_ {
        self.distances_m
            .iter()
            .zip(self.terrain_elev_m.iter())
            .map(|(&distance_m, &elevation_m)| ProfileSample {
                distance_m,
                elevation_m,
            })
    }

    /// Along-path distance of the last sample.
    pub fn total_distance_m(&self) -> C {
        self.distances_m.last().copied().unwrap_or_default()
    }

    /// Returns (lowest, highest) elevation.
    pub fn elevation_range(&self) -> (C, C) {
        self.terrain_elev_m
            .iter()
            .fold((C::INFINITY, C::NEG_INFINITY), |(lo, hi), &elev| {
                (lo.min(elev), hi.max(elev))
            })
    }

    /// Returns the summed (climb, drop) between consecutive samples.
    pub fn ascent_descent(&self) -> (C, C) {
        self.terrain_elev_m
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold((0.0, 0.0), |(up, down), delta| {
                if delta > 0.0 {
                    (up + delta, down)
                } else {
                    (up, down - delta)
                }
            })
    }
}

pub struct ProfileBuilder {
    /// Path to profile (required).
    path: Option<LineString<C>>,

    /// Approximate number of samples spread over the path.
    sample_budget: usize,
}

impl ProfileBuilder {
    /// Path to profile, in longitude/latitude (required).
    #[must_use]
    pub fn path(mut self, path: LineString<C>) -> Self {
        self.path = Some(path);
        self
    }

    /// Approximate number of samples to take along the whole path
    /// (defaults to 100).
    ///
    /// Every segment gets at least two samples regardless.
    #[must_use]
    pub fn sample_budget(mut self, samples: usize) -> Self {
        self.sample_budget = samples;
        self
    }

    pub fn build(&self, dem: &DemData) -> Result<Profile, TerrainError> {
        let coords = &self.path.as_ref().ok_or(TerrainError::Builder("path"))?.0;

        let total_km = line_length(coords);
        if total_km.is_nan() || total_km <= 0.0 {
            return Err(TerrainError::DegenerateLine);
        }

        let now = std::time::Instant::now();
        let mut profile = Profile {
            distances_m: Vec::with_capacity(self.sample_budget + coords.len()),
            path: Vec::with_capacity(self.sample_budget + coords.len()),
            terrain_elev_m: Vec::with_capacity(self.sample_budget + coords.len()),
        };
        let mut push = |distance_km: C, coord: Coord<C>| {
            if let Some(elevation) = dem.get(coord) {
                profile.distances_m.push(distance_km * 1000.0);
                profile.path.push(Point::from(coord));
                profile.terrain_elev_m.push(C::from(elevation));
            }
        };

        push(0.0, coords[0]);

        let mut travelled_km = 0.0;
        for segment in coords.windows(2) {
            let (start, end) = (segment[0], segment[1]);
            let segment_km = distance(start, end);
            let steps = segment_samples(self.sample_budget, segment_km, total_km);
            for t in fractions(steps) {
                let coord = Coord {
                    x: start.x + t * (end.x - start.x),
                    y: start.y + t * (end.y - start.y),
                };
                push(travelled_km + t * segment_km, coord);
            }
            travelled_km += segment_km;
        }

        debug!(
            "profile; len: {}, path_km: {total_km}, exec: {:?}",
            profile.len(),
            now.elapsed()
        );

        if profile.len() < 2 {
            Err(TerrainError::InsufficientCoverage {
                found: profile.len(),
                required: 2,
            })
        } else {
            Ok(profile)
        }
    }
}

/// Returns this segment's share of `budget`, never fewer than two.
fn segment_samples(budget: usize, segment_km: C, total_km: C) -> usize {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let share = (budget as C * (segment_km / total_km)).ceil() as usize;
    share.max(2)
}

/// Returns `n` evenly spaced fractions in (0, 1], ending at exactly 1.
#[allow(clippy::cast_precision_loss)]
fn fractions(n: usize) -> impl Iterator<Item = C> {
    (1..=n).map(move |i| i as C / n as C)
}
