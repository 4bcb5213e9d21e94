//! Scales: pure maps from data values to pixels or colors.
//!
//! Every constructor derives its domain from the subset it is handed and nothing else; there is
//! no caching between calls. A domain whose ends coincide (one distinct value, or no values at
//! all) is *degenerate*: continuous scales then map every input to the middle of their range.

use crate::error::{Result, VizError};
use crate::palette::{self, NEUTRAL_FILL, Rgba};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Pixel interval `(start, end)`. `end < start` is allowed and flips the axis.
pub type PixelRange = (f64, f64);

/// Exponent of the default power scale (cube root).
pub const DEFAULT_EXPONENT: f64 = 1.0 / 3.0;

/// Minimum and maximum of the finite values, `None` when there are none.
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn domain_of<I: IntoIterator<Item = f64>>(values: I, baseline: Option<f64>) -> (f64, f64) {
    extent(values.into_iter().chain(baseline)).unwrap_or((0.0, 0.0))
}

#[inline]
fn midpoint(range: PixelRange) -> f64 {
    (range.0 + range.1) / 2.0
}

#[inline]
fn interpolate(t: f64, range: PixelRange) -> f64 {
    range.0 + t * (range.1 - range.0)
}

/// Axis tick: a domain value and where it lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick<T> {
    pub value: T,
    pub position: f64,
}

/// Round values covering `[a, b]`, roughly `count` of them.
///
/// The step is 1, 2 or 5 times a power of ten, whichever brings the number of ticks closest to
/// `count`. Ticks ascend whatever the order of `a` and `b`. A degenerate interval yields its
/// single value; `count == 0` or a non-finite end yields nothing.
pub fn nice_ticks(a: f64, b: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if count == 0 || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    if lo == hi {
        return vec![lo];
    }
    let raw = (hi - lo) / count as f64;
    let exp = raw.log10().floor();
    let power = 10f64.powf(exp);
    let err = raw / power;
    let factor = if err >= 50f64.sqrt() {
        10.0
    } else if err >= 10f64.sqrt() {
        5.0
    } else if err >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    // below one, divide by the integral reciprocal so 0.1 * 3 stays 0.3
    if exp >= 0.0 {
        let step = factor * power;
        multiples((lo / step).ceil(), (hi / step).floor())
            .map(|i| i * step)
            .collect()
    } else {
        let inv = 10f64.powf(-exp) / factor;
        multiples((lo * inv).ceil(), (hi * inv).floor())
            .map(|i| i / inv)
            .collect()
    }
}

fn multiples(first: f64, last: f64) -> impl Iterator<Item = f64> {
    (first as i64..=last as i64).map(|i| i as f64)
}

/// Linear map from `[min, max]` to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: PixelRange,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: PixelRange) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    pub fn is_degenerate(&self) -> bool {
        let span = self.domain.1 - self.domain.0;
        span == 0.0 || !span.is_finite()
    }

    pub fn apply(&self, v: f64) -> f64 {
        if self.is_degenerate() {
            return midpoint(self.range);
        }
        interpolate((v - self.domain.0) / (self.domain.1 - self.domain.0), self.range)
    }

    /// Pixel back to domain value; a degenerate scale inverts to its single value.
    pub fn invert(&self, px: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if self.is_degenerate() || span == 0.0 {
            return self.domain.0;
        }
        self.domain.0 + (px - self.range.0) / span * (self.domain.1 - self.domain.0)
    }

    /// Round tick values over the domain; see [`nice_ticks`].
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.domain.0, self.domain.1, count)
    }

    /// Same domain, range ends swapped.
    pub fn reversed(self) -> Self {
        Self {
            domain: self.domain,
            range: (self.range.1, self.range.0),
        }
    }
}

/// Power map: `sign(v) * |v|^exponent`, then linear onto the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerScale {
    exponent: f64,
    domain: (f64, f64),
    range: PixelRange,
}

impl PowerScale {
    pub fn new(domain: (f64, f64), exponent: f64, range: PixelRange) -> Self {
        Self {
            exponent,
            domain,
            range,
        }
    }

    fn transform(&self, v: f64) -> f64 {
        v.signum() * v.abs().powf(self.exponent)
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    pub fn apply(&self, v: f64) -> f64 {
        let t0 = self.transform(self.domain.0);
        let t1 = self.transform(self.domain.1);
        let span = t1 - t0;
        if span == 0.0 || !span.is_finite() {
            return midpoint(self.range);
        }
        interpolate((self.transform(v) - t0) / span, self.range)
    }

    /// Ticks are round in the data, not in the transformed space.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.domain.0, self.domain.1, count)
    }
}

/// Continuous value axis that is either linear or power encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueScale {
    Linear(LinearScale),
    Power(PowerScale),
}

impl ValueScale {
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            ValueScale::Linear(s) => s.apply(v),
            ValueScale::Power(s) => s.apply(v),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        match self {
            ValueScale::Linear(s) => s.domain(),
            ValueScale::Power(s) => s.domain(),
        }
    }

    pub fn range(&self) -> PixelRange {
        match self {
            ValueScale::Linear(s) => s.range(),
            ValueScale::Power(s) => s.range(),
        }
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self {
            ValueScale::Linear(s) => s.ticks(count),
            ValueScale::Power(s) => s.ticks(count),
        }
    }
}

/// Linear map over calendar dates (day resolution).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: Option<(NaiveDate, NaiveDate)>,
    range: PixelRange,
}

impl TimeScale {
    pub fn new(domain: Option<(NaiveDate, NaiveDate)>, range: PixelRange) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.domain
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    pub fn apply(&self, date: NaiveDate) -> f64 {
        let Some((lo, hi)) = self.domain else {
            return midpoint(self.range);
        };
        let d0 = f64::from(lo.num_days_from_ce());
        let d1 = f64::from(hi.num_days_from_ce());
        if d1 == d0 {
            return midpoint(self.range);
        }
        interpolate((f64::from(date.num_days_from_ce()) - d0) / (d1 - d0), self.range)
    }

    /// January 1st of round years inside the domain, about `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<NaiveDate> {
        let Some((lo, hi)) = self.domain else {
            return Vec::new();
        };
        let first = if lo.ordinal() == 1 {
            lo.year()
        } else {
            lo.year() + 1
        };
        if first > hi.year() {
            return Vec::new();
        }
        nice_ticks(f64::from(first), f64::from(hi.year()), count)
            .into_iter()
            .filter(|y| y.fract() == 0.0)
            .filter_map(|y| NaiveDate::from_ymd_opt(y as i32, 1, 1))
            .collect()
    }
}

/// Evenly spaced positions for a fixed, ordered category set.
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale {
    domain: Vec<String>,
    range: PixelRange,
}

impl PointScale {
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    /// Distance between neighbouring categories; zero with fewer than two.
    pub fn step(&self) -> f64 {
        if self.domain.len() < 2 {
            return 0.0;
        }
        (self.range.1 - self.range.0) / (self.domain.len() - 1) as f64
    }

    pub fn position(&self, index: usize) -> f64 {
        if self.domain.len() < 2 {
            return midpoint(self.range);
        }
        self.range.0 + self.step() * index as f64
    }

    /// Position of a category, `None` when it is not part of the domain.
    pub fn apply(&self, category: &str) -> Option<f64> {
        self.domain
            .iter()
            .position(|c| c == category)
            .map(|i| self.position(i))
    }
}

/// Category → color, cycling through the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalColor {
    domain: Vec<String>,
    palette: Vec<Rgba>,
}

impl OrdinalColor {
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn apply(&self, category: &str) -> Option<Rgba> {
        self.domain
            .iter()
            .position(|c| c == category)
            .map(|i| self.palette[i % self.palette.len()])
    }

    /// Like [`OrdinalColor::apply`], unknown categories fall back to the neutral fill.
    pub fn color_or_neutral(&self, category: &str) -> Rgba {
        self.apply(category).unwrap_or(NEUTRAL_FILL)
    }

    /// `(category, color)` pairs in domain order.
    pub fn legend(&self) -> Vec<(String, Rgba)> {
        self.domain
            .iter()
            .map(|c| (c.clone(), self.color_or_neutral(c)))
            .collect()
    }
}

/// Numeric value → color by the breakpoint interval it falls into.
///
/// With breakpoints `b0 < b1 < … < bn-1` and colors `c0 … cn`: `v < b0` → `c0`,
/// `b(i-1) <= v < b(i)` → `c(i)`, `v >= b(n-1)` → `cn`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdColor {
    breakpoints: Vec<f64>,
    palette: Vec<Rgba>,
}

impl ThresholdColor {
    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    pub fn apply(&self, v: f64) -> Rgba {
        if v.is_nan() {
            return NEUTRAL_FILL;
        }
        let i = self.breakpoints.partition_point(|&b| b <= v);
        self.palette[i]
    }

    /// Missing values get the neutral "no data" fill.
    pub fn color_for(&self, v: Option<f64>) -> Rgba {
        v.map_or(NEUTRAL_FILL, |v| self.apply(v))
    }

    /// Legend labels paired with their colors.
    pub fn legend(&self) -> Vec<(String, Rgba)> {
        palette::threshold_labels(&self.breakpoints)
            .into_iter()
            .zip(self.palette.iter().copied())
            .collect()
    }
}

/// Coordinate and color scales of one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSet<X, Y, C> {
    pub x: X,
    pub y: Y,
    pub color: C,
}

pub fn linear<I: IntoIterator<Item = f64>>(values: I, range: PixelRange) -> LinearScale {
    LinearScale::new(domain_of(values, None), range)
}

/// Linear scale whose domain always includes `baseline` (e.g. a zero floor).
pub fn linear_with_baseline<I: IntoIterator<Item = f64>>(
    values: I,
    baseline: f64,
    range: PixelRange,
) -> LinearScale {
    LinearScale::new(domain_of(values, Some(baseline)), range)
}

pub fn power<I: IntoIterator<Item = f64>>(
    values: I,
    exponent: f64,
    range: PixelRange,
) -> PowerScale {
    PowerScale::new(domain_of(values, None), exponent, range)
}

pub fn power_with_baseline<I: IntoIterator<Item = f64>>(
    values: I,
    exponent: f64,
    baseline: f64,
    range: PixelRange,
) -> PowerScale {
    PowerScale::new(domain_of(values, Some(baseline)), exponent, range)
}

pub fn temporal<I: IntoIterator<Item = NaiveDate>>(values: I, range: PixelRange) -> TimeScale {
    let domain = values.into_iter().fold(None, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((d.min(lo), d.max(hi))),
    });
    TimeScale::new(domain, range)
}

/// Every category keeps its slot, whether or not any data falls into it.
pub fn ordinal_point<S: AsRef<str>>(domain: &[S], range: PixelRange) -> PointScale {
    PointScale {
        domain: domain.iter().map(|s| s.as_ref().to_string()).collect(),
        range,
    }
}

pub fn ordinal_color<S: AsRef<str>>(domain: &[S], palette: &[Rgba]) -> Result<OrdinalColor> {
    if palette.is_empty() {
        return Err(VizError::EmptyPalette);
    }
    Ok(OrdinalColor {
        domain: domain.iter().map(|s| s.as_ref().to_string()).collect(),
        palette: palette.to_vec(),
    })
}

pub fn threshold_color(breakpoints: &[f64], palette: &[Rgba]) -> Result<ThresholdColor> {
    if palette.len() != breakpoints.len() + 1 {
        return Err(VizError::PaletteMismatch {
            breakpoints: breakpoints.len(),
            colors: palette.len(),
        });
    }
    if breakpoints.windows(2).any(|w| !(w[0] <= w[1])) {
        return Err(VizError::UnsortedBreakpoints);
    }
    Ok(ThresholdColor {
        breakpoints: breakpoints.to_vec(),
        palette: palette.to_vec(),
    })
}

/// Default drug → color scale.
pub fn drug_colors() -> OrdinalColor {
    OrdinalColor {
        domain: palette::DRUGS.iter().map(|d| d.to_string()).collect(),
        palette: palette::DRUG_COLORS.to_vec(),
    }
}

/// Default milligram threshold scale for a drug.
pub fn drug_threshold(drug: &str) -> Result<ThresholdColor> {
    let ramp = palette::threshold_ramp(drug).ok_or_else(|| VizError::UnknownDrug(drug.into()))?;
    threshold_color(&palette::MG_BREAKPOINTS, ramp)
}
