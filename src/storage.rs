use crate::models::SeriesPoint;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Prefix cells a spreadsheet would evaluate as a formula.
fn guard_cell(s: &str) -> Cow<'_, str> {
    if s.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{s}"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Write flat series points as CSV with header.
pub fn write_csv<W: Write>(points: &[SeriesPoint], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.serialize((
        "country",
        "iso3",
        "json_country",
        "region",
        "subregion",
        "drug",
        "year",
        "value",
    ))?;
    for p in points {
        wtr.serialize((
            guard_cell(&p.country_key),
            guard_cell(&p.iso3),
            guard_cell(&p.json_country),
            p.region.region.as_deref().map(guard_cell),
            p.region.subregion.as_deref().map(guard_cell),
            guard_cell(&p.series_key),
            p.year(),
            p.y,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save flat series points as CSV with header.
pub fn save_csv<P: AsRef<Path>>(points: &[SeriesPoint], path: P) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(points, f)
}

/// Save flat series points as a pretty JSON array.
pub fn save_json<P: AsRef<Path>>(points: &[SeriesPoint], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(points)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Read and deserialize a JSON input file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
