//! Geometry input from the command line or GeoJSON.

use crate::options::Vertices;
use anyhow::{anyhow, bail, Result};
use geojson::{quick_collection, GeoJson};
use std::{fs::File, path::Path};
use terrain::geo::{
    geometry::{Coord, Geometry, GeometryCollection, LineString, Polygon},
    CoordsIter,
};

impl Vertices {
    /// Returns the vertices as longitude/latitude coordinates.
    pub fn coords(&self) -> Result<Vec<Coord<f64>>> {
        match &self.geojson {
            Some(path) => first_shape(path),
            None => Ok(self.coords.iter().map(|lat_lon| lat_lon.0).collect()),
        }
    }

    pub fn line_string(&self) -> Result<LineString<f64>> {
        let coords = self.coords()?;
        if coords.len() < 2 {
            bail!("a path needs at least two vertices");
        }
        Ok(LineString::new(coords))
    }

    /// Returns a polygon, closing the ring if needed.
    pub fn polygon(&self) -> Result<Polygon<f64>> {
        let mut ring = LineString::new(self.coords()?);
        ring.close();
        if ring.0.len() < 4 {
            bail!("a polygon needs at least three vertices");
        }
        Ok(Polygon::new(ring, vec![]))
    }
}

/// Returns the vertices of the first line or polygon in a GeoJSON
/// document.
fn first_shape(path: &Path) -> Result<Vec<Coord<f64>>> {
    let file = File::open(path)?;
    let geojson = GeoJson::from_reader(file)?;
    let collection: GeometryCollection<f64> = quick_collection(&geojson)?;
    collection
        .iter()
        .find_map(shape_coords)
        .ok_or_else(|| anyhow!("no line or polygon in {}", path.display()))
}

fn shape_coords(geometry: &Geometry<f64>) -> Option<Vec<Coord<f64>>> {
    match geometry {
        Geometry::LineString(line) => Some(line.0.clone()),
        Geometry::Polygon(polygon) => Some(polygon.exterior().0.clone()),
        Geometry::MultiLineString(lines) => lines.0.first().map(|line| line.0.clone()),
        Geometry::MultiPolygon(polygons) => polygons
            .0
            .first()
            .map(|polygon| polygon.exterior().0.clone()),
        Geometry::GeometryCollection(inner) => inner.iter().find_map(shape_coords),
        Geometry::Line(line) => Some(line.coords_iter().collect()),
        _ => None,
    }
}
