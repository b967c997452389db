//! Spherical-earth measurement helpers.

mod area;
mod format;
mod haversine;
mod ring;

pub use {
    area::polygon_area,
    format::{format_area, format_distance},
    haversine::{distance, line_length, EARTH_RADIUS_KM},
    ring::ring_contains,
};
