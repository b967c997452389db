//! SRTM/NASADEM elevation (`.hgt`) tiles.
//!
//! # References
//!
//! 1. [HGT file layout](https://www.researchgate.net/profile/Pierre-Boulanger-4/publication/228924813/figure/fig8/AS:300852653903880@1448740270695/Description-of-a-HGT-file-structure-The-name-file-in-this-case-is-N20W100HGT.png)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

use crate::{DemData, DemError, Elev, C};
use byteorder::{BigEndian as BE, ReadBytesExt};
use geo::geometry::{Coord, Rect};
use log::debug;
use std::{
    fs::File,
    io::{BufReader, Read},
    mem::size_of,
    path::Path,
};

/// HGT marks voids with the most negative `i16`.
const HGT_VOID: i16 = i16::MIN;

impl DemData {
    /// Returns the tile at `path` read into memory.
    ///
    /// The tile is geographic, so no projection is attached.
    pub fn from_hgt<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let side = extract_side(&path)?;
        let sw_corner = parse_sw_corner(&path)?;
        debug!("loading {:?}, {side}x{side}", path.as_ref());
        let file = BufReader::new(File::open(path)?);
        read_hgt(sw_corner, side, file)
    }
}

/// Reads `side * side` big-endian samples, north row first.
///
/// Samples are _centred_ on whole-degree lines, so the raster extent
/// is padded by half a cell on every edge.
fn read_hgt<R: Read>(sw_corner: Coord<i16>, side: usize, mut rdr: R) -> Result<DemData, DemError> {
    let mut samples = Vec::with_capacity(side * side);
    for _ in 0..(side * side) {
        samples.push(Elev::from(rdr.read_i16::<BE>()?));
    }

    #[allow(clippy::cast_precision_loss)]
    let cell_deg = 1.0 / (side - 1) as C;
    let half_cell = cell_deg / 2.0;
    let sw = Coord {
        x: C::from(sw_corner.x),
        y: C::from(sw_corner.y),
    };
    let bbox = Rect::new(
        Coord {
            x: sw.x - half_cell,
            y: sw.y - half_cell,
        },
        Coord {
            x: sw.x + 1.0 + half_cell,
            y: sw.y + 1.0 + half_cell,
        },
    );

    Ok(DemData::geographic(samples, side, side, bbox)?.with_no_data(Elev::from(HGT_VOID)))
}

/// Returns the number of samples along one edge of the tile.
fn extract_side<P: AsRef<Path>>(path: P) -> Result<usize, DemError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok(3601),
        RES_3_ARCSECONDS_FILE_LEN => Ok(1201),
        invalid_len => Err(DemError::HgtLen(invalid_len, path.as_ref().to_owned())),
    }
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, DemError> {
    let mk_err = || DemError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
