//! Reshaping of nested country records into flat per-datum sequences.
//!
//! Every country carries one `years` array and one value array per drug. The arrays are
//! parallel but not sorted, so the year order is derived once per country with
//! [`sort_indices`] and the same permutation is applied to every drug's values.

use crate::error::{Result, VizError};
use crate::models::{CountryProfile, Series, SeriesKey, SeriesPoint};
use ahash::AHashMap;
use log::{debug, warn};

/// Indices that sort `values` ascending; equal values keep their input order.
pub fn sort_indices<T: Ord>(values: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].cmp(&values[b]));
    order
}

/// Series of a single country, one per drug, each ascending by year.
///
/// `null` observations are skipped, never replaced by zero.
pub fn country_series(profile: &CountryProfile) -> Result<Vec<Series>> {
    let info = &profile.info;
    let years = &profile.ts.years;
    let order = sort_indices(years);
    let region = info.region_info();

    let mut out = Vec::with_capacity(profile.ts.drugs.len());
    for (drug, values) in &profile.ts.drugs {
        if values.len() != years.len() {
            return Err(VizError::LengthMismatch {
                country: info.country.clone(),
                drug: drug.clone(),
                years: years.len(),
                values: values.len(),
            });
        }
        let points = order
            .iter()
            .filter_map(|&i| {
                values[i].map(|y| SeriesPoint {
                    x: years[i].date(),
                    y,
                    series_key: drug.clone(),
                    country_key: info.country.clone(),
                    iso3: info.iso3.clone(),
                    json_country: info.json_country.clone(),
                    region: region.clone(),
                })
            })
            .collect();
        out.push(Series {
            key: SeriesKey::new(drug, &info.country),
            iso3: info.iso3.clone(),
            json_country: info.json_country.clone(),
            points,
        });
    }
    Ok(out)
}

/// One series per (country, drug) pair, in input order of countries and key order of drugs.
pub fn reshape_to_series(profiles: &[CountryProfile]) -> Result<Vec<Series>> {
    let mut out = Vec::new();
    for profile in profiles {
        out.extend(country_series(profile)?);
    }
    debug!(
        "reshaped {} profiles into {} series",
        profiles.len(),
        out.len()
    );
    Ok(out)
}

/// One point per (country, drug, year) triple with a value.
pub fn reshape_to_flat_points(profiles: &[CountryProfile]) -> Result<Vec<SeriesPoint>> {
    Ok(reshape_to_series(profiles)?
        .into_iter()
        .flat_map(|s| s.points)
        .collect())
}

impl CountryProfile {
    /// Value of `drug` in `year`, or `None` when the drug or the observation is missing.
    pub fn value_at(&self, drug: &str, year: i32) -> Result<Option<f64>> {
        let Some(values) = self.ts.drugs.get(drug) else {
            return Ok(None);
        };
        if values.len() != self.ts.years.len() {
            return Err(VizError::LengthMismatch {
                country: self.info.country.clone(),
                drug: drug.to_string(),
                years: self.ts.years.len(),
                values: values.len(),
            });
        }
        Ok(self
            .ts
            .years
            .iter()
            .zip(values)
            .find(|(y, _)| y.year() == year)
            .and_then(|(_, v)| *v))
    }
}

/// Result of looking a geographic feature up in a [`CountryIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountryLookup<'a> {
    Found(&'a CountryProfile),
    /// No profile matches; rendered with the neutral fill.
    NoData,
}

impl<'a> CountryLookup<'a> {
    pub fn profile(&self) -> Option<&'a CountryProfile> {
        match *self {
            CountryLookup::Found(p) => Some(p),
            CountryLookup::NoData => None,
        }
    }
}

/// Geographic feature name → matching profile.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex<'a> {
    by_feature: AHashMap<String, &'a CountryProfile>,
}

impl<'a> CountryIndex<'a> {
    pub fn get(&self, feature: &str) -> Option<&'a CountryProfile> {
        self.by_feature.get(feature).copied()
    }

    pub fn lookup(&self, feature: &str) -> CountryLookup<'a> {
        self.get(feature)
            .map_or(CountryLookup::NoData, CountryLookup::Found)
    }

    pub fn len(&self) -> usize {
        self.by_feature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_feature.is_empty()
    }
}

/// Match feature names against `StaticInfo::json_country`.
///
/// Names without a profile are simply absent. Should two profiles claim the same feature, the
/// first one wins and a warning is logged.
pub fn build_country_index<'a, I, S>(
    profiles: &'a [CountryProfile],
    feature_names: I,
) -> CountryIndex<'a>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut by_json: AHashMap<&str, &'a CountryProfile> = AHashMap::with_capacity(profiles.len());
    for p in profiles {
        let name = p.info.json_country.as_str();
        if by_json.contains_key(name) {
            warn!("more than one profile for feature {name:?}; keeping the first");
            continue;
        }
        by_json.insert(name, p);
    }

    let mut by_feature = AHashMap::new();
    let mut unmatched = 0usize;
    for name in feature_names {
        let name = name.as_ref();
        match by_json.get(name) {
            Some(p) => {
                by_feature.insert(name.to_string(), *p);
            }
            None => unmatched += 1,
        }
    }
    debug!(
        "country index: {} matched, {} features without data",
        by_feature.len(),
        unmatched
    );
    CountryIndex { by_feature }
}

/// Position and display name of the profile behind a geographic feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryMatch {
    pub index: usize,
    pub country: String,
}

pub fn find_country(profiles: &[CountryProfile], json_country: &str) -> Option<CountryMatch> {
    profiles
        .iter()
        .position(|p| p.info.json_country == json_country)
        .map(|index| CountryMatch {
            index,
            country: profiles[index].info.country.clone(),
        })
}

/// Subset selection over reshaped points and series.
///
/// `countries` holds geographic (`json_country`) names. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesFilter<'a> {
    pub country: Option<&'a str>,
    pub countries: Option<&'a [String]>,
    pub drugs: Option<&'a [String]>,
}

impl SeriesFilter<'_> {
    fn accepts(&self, country: &str, json_country: &str, drug: &str) -> bool {
        self.country.is_none_or(|c| c == country)
            && self
                .countries
                .is_none_or(|cs| cs.iter().any(|c| c == json_country))
            && self.drugs.is_none_or(|ds| ds.iter().any(|d| d == drug))
    }

    pub fn matches_point(&self, p: &SeriesPoint) -> bool {
        self.accepts(&p.country_key, &p.json_country, &p.series_key)
    }

    pub fn matches_series(&self, s: &Series) -> bool {
        self.accepts(&s.key.country, &s.json_country, &s.key.drug)
    }

    pub fn points(&self, points: &[SeriesPoint]) -> Vec<SeriesPoint> {
        points
            .iter()
            .filter(|p| self.matches_point(p))
            .cloned()
            .collect()
    }

    pub fn series(&self, series: &[Series]) -> Vec<Series> {
        series
            .iter()
            .filter(|s| self.matches_series(s))
            .cloned()
            .collect()
    }
}
