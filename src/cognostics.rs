//! Cognostic histogram input.
//!
//! Cognostics arrive precomputed as nested arrays of rows (one inner array per country/drug
//! group). Each row names the interval bin it falls into, e.g. `"[0.139,0.518)"`. Ranks carried
//! by the input are ignored; [`crate::rank`] recomputes them for whatever subset is shown.

use crate::models::HistogramPoint;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LOWER_ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\[(]\s*([^,\s]+)\s*,").expect("lower endpoint pattern is valid")
});

/// Raw cognostic row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognosticRecord {
    /// Bin label.
    pub q: String,
    #[serde(default)]
    pub rank: Option<f64>,
    pub drug: String,
    pub value: f64,
    /// Cognostic name.
    #[serde(rename = "L1")]
    pub cognostic: String,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    #[serde(default)]
    pub json_country: Option<String>,
}

impl From<&CognosticRecord> for HistogramPoint {
    fn from(r: &CognosticRecord) -> Self {
        Self {
            bin: r.q.clone(),
            rank: 0,
            series_key: r.drug.clone(),
            value: r.value,
            cognostic: r.cognostic.clone(),
            region: r.region.clone(),
            subregion: r.subregion.clone(),
            group_key: r.country.clone(),
            json_country: r.json_country.clone(),
        }
    }
}

/// Flatten the nested input rows into histogram points, preserving order.
pub fn flatten_cognostics(nested: &[Vec<CognosticRecord>]) -> Vec<HistogramPoint> {
    nested
        .iter()
        .flat_map(|group| group.iter().map(HistogramPoint::from))
        .collect()
}

/// Points of one cognostic whose drug and region are both selected.
pub fn filter_cognostics(
    points: &[HistogramPoint],
    cognostic: &str,
    drugs: &[String],
    regions: &[String],
) -> Vec<HistogramPoint> {
    points
        .iter()
        .filter(|p| {
            p.cognostic == cognostic
                && drugs.contains(&p.series_key)
                && p.region.as_ref().is_some_and(|r| regions.contains(r))
        })
        .cloned()
        .collect()
}

/// Lower endpoint of an interval label such as `"[0.1,0.5)"` or `"(-inf,0]"`.
pub fn bin_lower_endpoint(label: &str) -> Option<f64> {
    LOWER_ENDPOINT
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Bins to lay out for the current subset.
///
/// A cognostic's full level list usually spans far more bins than the selection occupies. Only
/// the levels between the lowest and highest occupied bin are kept; empty bins in between keep
/// their slot. When occupied labels are not intervals the full level list is returned.
pub fn visible_bin_domain(levels: &[String], points: &[HistogramPoint]) -> Vec<String> {
    let occupied = points.iter().filter_map(|p| bin_lower_endpoint(&p.bin));
    let Some((lo, hi)) = occupied.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        if points.is_empty() {
            return Vec::new();
        }
        return levels.to_vec();
    };

    levels
        .iter()
        .filter(|b| bin_lower_endpoint(b).is_some_and(|v| v >= lo && v <= hi))
        .cloned()
        .collect()
}

/// Axis tick labels: about six evenly spaced bins, every bin when there are fewer.
pub fn bin_ticks(domain: &[String]) -> Vec<String> {
    let step = (domain.len() / 6).max(1);
    domain.iter().step_by(step).cloned().collect()
}
