mod input;
mod options;

use anyhow::{anyhow, Error as AnyError};
use clap::Parser;
use log::debug;
use options::{Cli, Command as CliCmd, Format, LatLon, Vertices};
use serde::Serialize;
use std::io::Write;
use terrain::{
    cell_size_m,
    dem::DemData,
    math::{format_area, format_distance, line_length, polygon_area},
    BasePlane, Profile, Volume,
};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli { hgt, no_data, cmd } = Cli::parse();

    env_logger::init();

    let load_dem = || -> Result<DemData, AnyError> {
        let path = hgt
            .as_ref()
            .ok_or_else(|| anyhow!("--hgt is required for this command"))?;
        let dem = DemData::from_hgt(path)?;
        let dem = match no_data {
            Some(no_data) => dem.with_no_data(no_data),
            None => dem,
        };
        debug!("{dem:?}");
        Ok(dem)
    };

    match cmd {
        CliCmd::Info => print_info(&load_dem()?),
        CliCmd::Sample { at } => print_sample(&load_dem()?, at),
        CliCmd::Measure(vertices) => print_measure(&vertices),
        CliCmd::Profile {
            vertices,
            samples,
            format,
        } => {
            let profile = Profile::builder()
                .path(vertices.line_string()?)
                .sample_budget(samples)
                .build(&load_dem()?)?;
            match format {
                Format::Csv => print_csv(&profile),
                Format::Json => print_json(&profile),
                Format::Plot => {
                    plot_ascii(&profile);
                    Ok(())
                }
            }
        }
        CliCmd::Volume {
            vertices,
            method,
            elevation,
            grid_size,
            json,
        } => {
            let mut builder = Volume::builder()
                .polygon(vertices.polygon()?)
                .method(method)
                .grid_size(grid_size);
            if let Some(elevation) = elevation {
                builder = builder.fixed_elevation(elevation);
            }
            let volume = builder.build(&load_dem()?)?;
            if json {
                print_volume_json(&volume)
            } else {
                print_volume(&volume)
            }
        }
    }
}

fn print_info(dem: &DemData) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    let (cell_x_m, cell_y_m) = cell_size_m(dem);
    writeln!(stdout, "dimensions: {}x{}", dem.width(), dem.height())?;
    writeln!(stdout, "extent:     {:?}", dem.wgs84_bbox())?;
    writeln!(stdout, "cell size:  {cell_x_m:.1} m x {cell_y_m:.1} m")?;
    if let (Some(min), Some(max)) = (dem.min_elevation(), dem.max_elevation()) {
        writeln!(stdout, "elevation:  {min} m .. {max} m")?;
    }
    Ok(())
}

fn print_sample(dem: &DemData, LatLon(coord): LatLon) -> Result<(), AnyError> {
    match dem.try_get(coord) {
        Ok(elevation) => println!("{elevation}"),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

fn print_measure(vertices: &Vertices) -> Result<(), AnyError> {
    let coords = vertices.coords()?;
    println!("length: {}", format_distance(line_length(&coords)));
    if coords.len() >= 3 {
        println!("area:   {}", format_area(polygon_area(&coords)));
    }
    Ok(())
}

fn print_csv(profile: &Profile) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Distance,Longitude,Latitude,Elevation")?;
    for ((distance, point), elevation) in profile
        .distances_m
        .iter()
        .zip(profile.path.iter())
        .zip(profile.terrain_elev_m.iter())
    {
        let longitude = point.x();
        let latitude = point.y();
        writeln!(stdout, "{distance},{longitude},{latitude},{elevation}")?;
    }
    Ok(())
}

fn print_json(profile: &Profile) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        distance: f64,
        location: [f64; 2],
        elevation: f64,
    }

    let reshaped: Vec<JsonEntry> = profile
        .samples()
        .zip(profile.path.iter())
        .map(|(sample, point)| JsonEntry {
            distance: sample.distance_m,
            location: [point.x(), point.y()],
            elevation: sample.elevation_m,
        })
        .collect();
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot_ascii(profile: &Profile) {
    let plot_data: Vec<(f32, f32)> = profile
        .samples()
        .map(|sample| (sample.distance_m as f32, sample.elevation_m as f32))
        .collect();
    Chart::new(300, 150, 0.0, profile.total_distance_m() as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
    let (lowest, highest) = profile.elevation_range();
    let (ascent, descent) = profile.ascent_descent();
    println!(
        "length: {}, elevation: {lowest} m .. {highest} m, ascent: {ascent:.1} m, descent: {descent:.1} m",
        format_distance(profile.total_distance_m() / 1000.0)
    );
}

fn print_volume(volume: &Volume) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "method: {}", volume.method)?;
    match volume.base {
        BasePlane::Flat { elevation } => writeln!(stdout, "base:   flat at {elevation:.2} m")?,
        BasePlane::Tilted { a, b, c } => {
            writeln!(stdout, "base:   z = {a:.6e}·x + {b:.6e}·y + {c:.3}")?;
        }
    }
    writeln!(stdout, "area:   {}", format_area(volume.area_m2))?;
    writeln!(stdout, "cells:  {}", volume.cells)?;
    writeln!(stdout, "cut:    {:.1} m³", volume.cut_m3)?;
    writeln!(stdout, "fill:   {:.1} m³", volume.fill_m3)?;
    writeln!(stdout, "net:    {:.1} m³", volume.net_m3)?;
    Ok(())
}

fn print_volume_json(volume: &Volume) -> Result<(), AnyError> {
    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum JsonBase {
        Flat { elevation: f64 },
        Tilted { a: f64, b: f64, c: f64 },
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct JsonVolume {
        cut: f64,
        fill: f64,
        net: f64,
        base_plane: JsonBase,
        method: String,
        area: f64,
        cells: usize,
    }

    let base_plane = match volume.base {
        BasePlane::Flat { elevation } => JsonBase::Flat { elevation },
        BasePlane::Tilted { a, b, c } => JsonBase::Tilted { a, b, c },
    };
    let json = serde_json::to_string(&JsonVolume {
        cut: volume.cut_m3,
        fill: volume.fill_m3,
        net: volume.net_m3,
        base_plane,
        method: volume.method.to_string(),
        area: volume.area_m2,
        cells: volume.cells,
    })?;
    println!("{json}");
    Ok(())
}
