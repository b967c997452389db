//! Reference surfaces for cut/fill.

use crate::{Sample, TerrainError};
use dem::C;
use geo::geometry::Coord;
use std::{fmt, str::FromStr};

/// Below this the best-fit normal equations are treated as singular.
const SINGULAR_DETERMINANT: C = 1e-9;

/// How the base plane is derived from the polygon's perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Flat at the lowest perimeter elevation.
    LowestPoint,
    /// Flat at the mean perimeter elevation.
    AveragePerimeter,
    /// Flat at a caller supplied elevation.
    FixedElevation,
    /// Least-squares plane through the perimeter.
    BestFit,
}

impl Method {
    pub const ALL: [Self; 4] = [
        Self::LowestPoint,
        Self::AveragePerimeter,
        Self::FixedElevation,
        Self::BestFit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowestPoint => "lowestPoint",
            Self::AveragePerimeter => "averagePerimeter",
            Self::FixedElevation => "fixedElevation",
            Self::BestFit => "bestFit",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, TerrainError> {
        match s {
            "lowestPoint" | "lowest-point" => Ok(Self::LowestPoint),
            "averagePerimeter" | "average-perimeter" => Ok(Self::AveragePerimeter),
            "fixedElevation" | "fixed-elevation" => Ok(Self::FixedElevation),
            "bestFit" | "best-fit" => Ok(Self::BestFit),
            other => Err(TerrainError::UnknownMethod(other.to_owned())),
        }
    }
}

/// Surface cut and fill are measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BasePlane {
    Flat {
        elevation: C,
    },

    /// `elevation = a * x + b * y + c` in the raster's native
    /// coordinate space.
    Tilted {
        a: C,
        b: C,
        c: C,
    },
}

impl BasePlane {
    /// Returns the plane's elevation at a native (projected)
    /// coordinate.
    pub fn elevation_at(&self, Coord { x, y }: Coord<C>) -> C {
        match *self {
            Self::Flat { elevation } => elevation,
            Self::Tilted { a, b, c } => a * x + b * y + c,
        }
    }

    /// Derives a base plane from resolved perimeter samples.
    ///
    /// `fixed_elevation` is only consulted for
    /// [`Method::FixedElevation`].
    pub fn fit(
        method: Method,
        perimeter: &[Sample],
        fixed_elevation: Option<C>,
    ) -> Result<Self, TerrainError> {
        let elevations = perimeter.iter().map(|sample| sample.elevation);
        match method {
            Method::LowestPoint => {
                if perimeter.is_empty() {
                    return Err(TerrainError::InsufficientCoverage {
                        found: 0,
                        required: 1,
                    });
                }
                let elevation = elevations.fold(C::INFINITY, C::min);
                Ok(Self::Flat { elevation })
            }
            Method::AveragePerimeter => {
                if perimeter.is_empty() {
                    return Err(TerrainError::InsufficientCoverage {
                        found: 0,
                        required: 1,
                    });
                }
                #[allow(clippy::cast_precision_loss)]
                let elevation = elevations.sum::<C>() / perimeter.len() as C;
                Ok(Self::Flat { elevation })
            }
            Method::FixedElevation => fixed_elevation
                .map(|elevation| Self::Flat { elevation })
                .ok_or(TerrainError::MissingFixedElevation),
            Method::BestFit => Self::best_fit(perimeter),
        }
    }

    /// Ordinary least-squares plane through `samples`' projected
    /// coordinates, solved from the 3x3 normal equations.
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    fn best_fit(samples: &[Sample]) -> Result<Self, TerrainError> {
        let mut s = Sums::default();
        for sample in samples {
            s.add(sample.projected, sample.elevation);
        }
        let Sums {
            n,
            x,
            y,
            z,
            xx,
            xy,
            yy,
            xz,
            yz,
        } = s;

        // Cofactors of the (symmetric) normal matrix
        //
        //   | xx xy x |
        //   | xy yy y |
        //   | x  y  n |
        let c00 = yy * n - y * y;
        let c01 = x * y - xy * n;
        let c02 = xy * y - yy * x;
        let c11 = xx * n - x * x;
        let c12 = xy * x - xx * y;
        let c22 = xx * yy - xy * xy;

        let determinant = xx * c00 + xy * c01 + x * c02;
        if determinant.is_nan() || determinant.abs() < SINGULAR_DETERMINANT {
            return Err(TerrainError::DegenerateFit { determinant });
        }

        let a = (c00 * xz + c01 * yz + c02 * z) / determinant;
        let b = (c01 * xz + c11 * yz + c12 * z) / determinant;
        let c = (c02 * xz + c12 * yz + c22 * z) / determinant;
        Ok(Self::Tilted { a, b, c })
    }
}

/// Running sums for the normal equations.
#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    n: C,
    x: C,
    y: C,
    z: C,
    xx: C,
    xy: C,
    yy: C,
    xz: C,
    yz: C,
}

impl Sums {
    fn add(&mut self, Coord { x, y }: Coord<C>, z: C) {
        self.n += 1.0;
        self.x += x;
        self.y += y;
        self.z += z;
        self.xx += x * x;
        self.xy += x * y;
        self.yy += y * y;
        self.xz += x * z;
        self.yz += y * z;
    }
}
