//! CSV dataset loading.
//!
//! Reads the `rg_cities1000.csv` layout: a `lat,lon,name,admin1,admin2,cc`
//! header followed by one row per place. The loader is a collaborator of
//! the core: it produces the record vector whose positions the spatial
//! index later hands back.

use crate::error::{GeocodeError, Result};
use crate::types::Location;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Column names the dataset header must carry, in order.
pub const EXPECTED_HEADER: [&str; 6] = ["lat", "lon", "name", "admin1", "admin2", "cc"];

/// Load records from any reader producing the expected CSV layout.
///
/// The header is validated strictly (count and names). Data rows with too
/// few fields or unparsable coordinates are skipped with a warning rather
/// than failing the load, matching the tolerant ingestion the dataset's
/// upstream dumps require.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Vec<Location>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    validate_header(csv_reader.headers()?)?;

    let mut records = Vec::with_capacity(1024);
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        if record.len() < EXPECTED_HEADER.len() {
            log::warn!("skipping row {}: only {} fields", row + 1, record.len());
            continue;
        }

        let lat = record[0].parse::<f64>();
        let lon = record[1].parse::<f64>();
        let (Ok(lat), Ok(lon)) = (lat, lon) else {
            log::warn!("skipping row {}: unparsable coordinates", row + 1);
            continue;
        };

        records.push(Location::new(
            lat,
            lon,
            &record[2],
            &record[3],
            &record[4],
            &record[5],
        ));
    }

    log::info!("loaded {} location records", records.len());
    Ok(records)
}

/// Load records from a CSV file on disk.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Location>> {
    let path = path.as_ref();
    log::info!("loading dataset: {}", path.display());
    let file = File::open(path)?;
    load_from_reader(BufReader::new(file))
}

fn validate_header(header: &csv::StringRecord) -> Result<()> {
    if header.len() != EXPECTED_HEADER.len() {
        return Err(GeocodeError::InvalidDataset(format!(
            "unexpected header column count: {}",
            header.len()
        )));
    }
    for (i, want) in EXPECTED_HEADER.iter().enumerate() {
        if &header[i] != *want {
            return Err(GeocodeError::InvalidDataset(format!(
                "invalid header at column {}: got {:?}, want {:?}",
                i, &header[i], want
            )));
        }
    }
    Ok(())
}
