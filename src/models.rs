use crate::error::{Result, VizError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Static attributes of a country (position `static` in the input records).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticInfo {
    /// Name shared with the cognostic and scatter data sets.
    pub country: String,
    pub iso3: String,
    /// Name of the matching geographic feature; also the display title.
    pub json_country: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    /// Any other static attribute carried by the input, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StaticInfo {
    pub fn region_info(&self) -> RegionInfo {
        RegionInfo {
            region: self.region.clone(),
            subregion: self.subregion.clone(),
        }
    }
}

/// A year stamp as found in the `years` array.
///
/// The input encodes years as `"YYYY-MM-DD"` strings, but bare `"YYYY"` strings and integer
/// years are accepted too and normalized to January 1st.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct YearStamp(pub NaiveDate);

impl YearStamp {
    pub fn parse(s: &str) -> Result<Self> {
        let t = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
            return Ok(Self(d));
        }
        let year = t
            .parse::<i32>()
            .map_err(|_| VizError::InvalidYear(s.to_string()))?;
        Self::from_year(year)
    }

    pub fn from_year(year: i32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .map(Self)
            .ok_or_else(|| VizError::InvalidYear(year.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl<'de> Deserialize<'de> for YearStamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        struct YearVisitor;

        impl Visitor<'_> for YearVisitor {
            type Value = YearStamp;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a date string (YYYY-MM-DD or YYYY) or an integer year")
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                let year = i32::try_from(v).map_err(E::custom)?;
                YearStamp::from_year(year).map_err(E::custom)
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                let year = i32::try_from(v).map_err(E::custom)?;
                YearStamp::from_year(year).map_err(E::custom)
            }

            fn visit_str<E>(self, s: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                YearStamp::parse(s).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(YearVisitor)
    }
}

/// Time-series block of a country: a `years` array plus one parallel value array per drug.
///
/// Neither `years` nor the drug arrays are guaranteed to be sorted; `null` values are
/// missing observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesBlock {
    pub years: Vec<YearStamp>,
    #[serde(flatten)]
    pub drugs: BTreeMap<String, Vec<Option<f64>>>,
}

/// Raw per-country record: static profile plus time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    #[serde(rename = "static")]
    pub info: StaticInfo,
    pub ts: TimeSeriesBlock,
}

impl CountryProfile {
    /// Drug names present in the time-series block, in key order.
    pub fn drugs(&self) -> impl Iterator<Item = &str> {
        self.ts.drugs.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionInfo {
    pub region: Option<String>,
    pub subregion: Option<String>,
}

/// One observation of one drug in one country and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: NaiveDate,
    pub y: f64,
    /// Drug name.
    pub series_key: String,
    /// Country name (`StaticInfo::country`).
    pub country_key: String,
    pub iso3: String,
    pub json_country: String,
    #[serde(flatten)]
    pub region: RegionInfo,
}

impl SeriesPoint {
    pub fn year(&self) -> i32 {
        self.x.year()
    }

    pub fn series_id(&self) -> SeriesKey {
        SeriesKey::new(&self.series_key, &self.country_key)
    }
}

/// All observations of one (country, drug) pair, ascending by year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: SeriesKey,
    pub iso3: String,
    pub json_country: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

/// Grouping key used for lines, histogram dots and scatter labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub drug: String,
    pub country: String,
}

impl SeriesKey {
    pub fn new(drug: &str, country: &str) -> Self {
        Self {
            drug: drug.to_string(),
            country: country.to_string(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.drug, self.country)
    }
}

/// Key of a time-series point. `country` is only set when several countries share a panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey {
    pub year: i32,
    pub drug: String,
    pub country: Option<String>,
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(c) => write!(f, "{}_{}_{}", self.year, self.drug, c),
            None => write!(f, "{}_{}", self.year, self.drug),
        }
    }
}

/// Whether a mark belongs to the focused drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Selected,
    Unselected,
}

impl Emphasis {
    /// Everything is selected while no drug is focused.
    pub fn for_drug(drug: &str, focus: Option<&str>) -> Self {
        match focus {
            Some(f) if f != drug => Emphasis::Unselected,
            _ => Emphasis::Selected,
        }
    }
}

/// A dot in the cognostic dot-histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramPoint {
    /// Interval label of the bin, e.g. `"[0.1,0.5)"`.
    pub bin: String,
    /// Position within the bin; assigned by [`crate::rank::assign_ranks`].
    pub rank: usize,
    /// Drug name.
    pub series_key: String,
    pub value: f64,
    pub cognostic: String,
    pub region: Option<String>,
    pub subregion: Option<String>,
    /// Country name.
    pub group_key: String,
    pub json_country: Option<String>,
}

impl HistogramPoint {
    pub fn series_id(&self) -> SeriesKey {
        SeriesKey::new(&self.series_key, &self.group_key)
    }
}

/// One country/drug position in an MDS or local-regression scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    #[serde(rename = "group_id")]
    pub country: String,
    #[serde(rename = "col_id")]
    pub drug: String,
    #[serde(rename = "x_id")]
    pub x: f64,
    #[serde(rename = "y_id")]
    pub y: f64,
    pub iso3: String,
    #[serde(default)]
    pub json_country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Only present for the local-regression data set.
    #[serde(default)]
    pub year: Option<i32>,
}

/// A geographic feature as handed over by the (external) projection layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    pub name: String,
    /// Pre-projected outline (e.g. SVG path data); passed through untouched.
    #[serde(default)]
    pub shape: Option<String>,
}
