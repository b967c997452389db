use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, str::FromStr};
use terrain::{geo::geometry::Coord, Method};

/// Measure elevations, terrain profiles and earthwork volumes.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// SRTM/NASADEM elevation (.hgt) tile.
    #[arg(long)]
    pub hgt: Option<PathBuf>,

    /// Treat this value as missing elevation, in addition to voids.
    #[arg(long)]
    pub no_data: Option<f32>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print raster dimensions, extent, and resolution.
    Info,

    /// Print the elevation at a single location.
    Sample {
        /// Location "lat,lon".
        #[arg(long)]
        at: LatLon,
    },

    /// Print the length of a path and, for three or more vertices, the
    /// area it encloses.
    Measure(Vertices),

    /// Sample terrain elevation along a path.
    Profile {
        #[command(flatten)]
        vertices: Vertices,

        /// Approximate number of samples along the whole path.
        #[arg(short, long, default_value_t = 100)]
        samples: usize,

        #[command(subcommand)]
        format: Format,
    },

    /// Calculate cut and fill inside a polygon.
    Volume {
        #[command(flatten)]
        vertices: Vertices,

        /// Base plane: lowestPoint, averagePerimeter, fixedElevation,
        /// or bestFit.
        #[arg(short, long)]
        method: Method,

        /// Base elevation in meters (fixedElevation only).
        #[arg(short, long)]
        elevation: Option<f64>,

        /// Integration lattice cells per side.
        #[arg(short, long, default_value_t = 50)]
        grid_size: usize,

        /// Print JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum Format {
    /// Print samples as CSV.
    Csv,

    /// Print samples as JSON.
    Json,

    /// Plot to terminal.
    Plot,
}

/// Geometry vertices, given inline or read from a GeoJSON file.
#[derive(Debug, Clone, Args)]
pub struct Vertices {
    /// Vertex "lat,lon"; repeat once per vertex.
    #[arg(long = "coord", conflicts_with = "geojson", allow_hyphen_values = true)]
    pub coords: Vec<LatLon>,

    /// GeoJSON file; the first line or polygon found is used.
    #[arg(long)]
    pub geojson: Option<PathBuf>,
}

#[derive(Clone, Debug, Copy)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(anyhow!("{lat},{lon} is not a valid lat,lon"));
        }
        Ok(Self(Coord { y: lat, x: lon }))
    }
}
