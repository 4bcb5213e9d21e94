//! Time-series panels.
//!
//! Both panels draw a dot per observation and a line per (drug, country) series. Both tracks
//! share one scale set. New dots and lines start flat on the zero baseline and transparent,
//! then rise to their values.
//!
//! - [`CountrySeriesChart`]: all drugs of one country, y linear over the focused drug.
//! - [`RegionSeriesChart`]: many countries and drugs, y on a cube-root scale, plus an iso3
//!   label at the end of every line.

use super::{Axes, Frame, MarkEncoder, MarkStyle, Paddings, TickCounts, placed, reconcile_marks};
use crate::error::Result;
use crate::hover::{self, HoverBinding};
use crate::models::{Emphasis, PointKey, Series, SeriesKey, SeriesPoint};
use crate::reconcile::{ReconcileReport, Track};
use crate::reshape::SeriesFilter;
use crate::scale::{
    self, DEFAULT_EXPONENT, OrdinalColor, ScaleSet, TimeScale, ValueScale,
};
use crate::surface::{Attrs, ElementId, MarkKind, RenderSurface};
use chrono::NaiveDate;

pub type SeriesScales = ScaleSet<TimeScale, ValueScale, OrdinalColor>;

/// Horizontal gap between a line end and its label.
const LABEL_OFFSET: f64 = 10.0;
const LABEL_FONT: f64 = 14.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesReport {
    pub points: ReconcileReport<PointKey>,
    pub lines: ReconcileReport<SeriesKey>,
    /// Only the regions panel draws labels.
    pub labels: Option<ReconcileReport<PointKey>>,
}

fn all_points(series: &[Series]) -> impl Iterator<Item = &SeriesPoint> + Clone {
    series.iter().flat_map(|s| s.points.iter())
}

/// Country panel scales: x spans every shown year, y the focused drug's values (all drugs
/// without a focus) and always zero.
pub fn country_scales(
    series: &[Series],
    focus: Option<&str>,
    frame: Frame,
    paddings: Paddings,
    colors: OrdinalColor,
) -> SeriesScales {
    let points = all_points(series);
    let focused = points
        .clone()
        .filter(|p| focus.is_none_or(|f| p.series_key == f))
        .map(|p| p.y);
    ScaleSet {
        x: scale::temporal(points.map(|p| p.x), paddings.x_range(frame)),
        y: ValueScale::Linear(scale::linear_with_baseline(
            focused,
            0.0,
            paddings.y_range(frame),
        )),
        color: colors,
    }
}

/// Regions panel scales: cube-root y over every shown value and zero.
pub fn region_scales(
    series: &[Series],
    frame: Frame,
    paddings: Paddings,
    colors: OrdinalColor,
) -> SeriesScales {
    let points = all_points(series);
    ScaleSet {
        x: scale::temporal(points.clone().map(|p| p.x), paddings.x_range(frame)),
        y: ValueScale::Power(scale::power_with_baseline(
            points.map(|p| p.y),
            DEFAULT_EXPONENT,
            0.0,
            paddings.y_range(frame),
        )),
        color: colors,
    }
}

/// Year ticks on x, value ticks on y.
pub fn series_axes(scales: &SeriesScales, counts: TickCounts) -> Axes<NaiveDate> {
    Axes {
        x: placed(scales.x.ticks(counts.x), |d| scales.x.apply(d)),
        y: placed(scales.y.ticks(counts.y), |v| scales.y.apply(v)),
    }
}

fn series_name(key: &SeriesKey) -> String {
    format!("series_{key}")
}

fn label_name(key: &SeriesKey) -> String {
    format!("label_{key}")
}

struct PointEncoder<'c> {
    scales: &'c SeriesScales,
    style: MarkStyle,
    focus: Option<&'c str>,
    /// Key points by country too, for panels showing several countries.
    per_country: bool,
}

impl MarkEncoder<SeriesPoint> for PointEncoder<'_> {
    type Key = PointKey;
    const KIND: MarkKind = MarkKind::Circle;

    fn key(&self, p: &SeriesPoint) -> PointKey {
        PointKey {
            year: p.year(),
            drug: p.series_key.clone(),
            country: self.per_country.then(|| p.country_key.clone()),
        }
    }

    fn name(&self, p: &SeriesPoint) -> String {
        format!("point_{}", self.key(p))
    }

    fn enter(&self, p: &SeriesPoint) -> Attrs {
        Attrs {
            x: Some(self.scales.x.apply(p.x)),
            y: Some(self.scales.y.apply(0.0)),
            opacity: Some(0.0),
            fill: Some(self.scales.color.color_or_neutral(&p.series_key)),
            ..Attrs::default()
        }
    }

    fn target(&self, p: &SeriesPoint) -> Attrs {
        let r = match Emphasis::for_drug(&p.series_key, self.focus) {
            Emphasis::Selected => 3.0 * self.style.radius,
            Emphasis::Unselected => self.style.radius,
        };
        Attrs {
            x: Some(self.scales.x.apply(p.x)),
            y: Some(self.scales.y.apply(p.y)),
            r: Some(r),
            opacity: Some(self.style.opacity),
            ..Attrs::default()
        }
    }
}

struct LineEncoder<'c> {
    scales: &'c SeriesScales,
    style: MarkStyle,
    /// Lines are only emphasized while a drug is focused.
    focus: Option<&'c str>,
    trend_hover: bool,
}

impl LineEncoder<'_> {
    fn path(&self, s: &Series, flat: bool) -> Vec<[f64; 2]> {
        s.points
            .iter()
            .map(|p| {
                let y = if flat { 0.0 } else { p.y };
                [self.scales.x.apply(p.x), self.scales.y.apply(y)]
            })
            .collect()
    }
}

impl MarkEncoder<Series> for LineEncoder<'_> {
    type Key = SeriesKey;
    const KIND: MarkKind = MarkKind::Path;

    fn key(&self, s: &Series) -> SeriesKey {
        s.key.clone()
    }

    fn name(&self, s: &Series) -> String {
        series_name(&s.key)
    }

    fn enter(&self, s: &Series) -> Attrs {
        Attrs {
            points: Some(self.path(s, true)),
            stroke: Some(self.scales.color.color_or_neutral(&s.key.drug)),
            stroke_width: Some(self.style.stroke_width),
            opacity: Some(0.0),
            ..Attrs::default()
        }
    }

    fn target(&self, s: &Series) -> Attrs {
        let emphasis = match self.focus {
            Some(_) => Emphasis::for_drug(&s.key.drug, self.focus),
            None => Emphasis::Unselected,
        };
        let width = match emphasis {
            Emphasis::Selected => 5.0 * self.style.stroke_width,
            Emphasis::Unselected => self.style.stroke_width,
        };
        Attrs {
            points: Some(self.path(s, false)),
            stroke_width: Some(width),
            opacity: Some(1.0),
            ..Attrs::default()
        }
    }

    fn hover(&self, s: &Series) -> Vec<HoverBinding> {
        if !self.trend_hover {
            return Vec::new();
        }
        hover::trend_line(
            &series_name(&s.key),
            &label_name(&s.key),
            &s.json_country,
            self.style.stroke_width,
        )
    }
}

struct LabelEncoder<'c> {
    scales: &'c SeriesScales,
    style: MarkStyle,
}

impl LabelEncoder<'_> {
    fn placed(&self, p: &SeriesPoint) -> Attrs {
        Attrs {
            x: Some(self.scales.x.apply(p.x) + LABEL_OFFSET),
            y: Some(self.scales.y.apply(p.y)),
            fill: Some(self.scales.color.color_or_neutral(&p.series_key)),
            text: Some(p.iso3.clone()),
            ..Attrs::default()
        }
    }
}

impl MarkEncoder<SeriesPoint> for LabelEncoder<'_> {
    type Key = PointKey;
    const KIND: MarkKind = MarkKind::Text;

    fn key(&self, p: &SeriesPoint) -> PointKey {
        PointKey {
            year: p.year(),
            drug: p.series_key.clone(),
            country: Some(p.country_key.clone()),
        }
    }

    fn name(&self, p: &SeriesPoint) -> String {
        label_name(&p.series_id())
    }

    fn enter(&self, p: &SeriesPoint) -> Attrs {
        Attrs {
            font_size: Some(LABEL_FONT),
            ..self.placed(p)
        }
    }

    fn target(&self, p: &SeriesPoint) -> Attrs {
        self.placed(p)
    }

    fn hover(&self, p: &SeriesPoint) -> Vec<HoverBinding> {
        let key = p.series_id();
        hover::trend_label(
            &label_name(&key),
            &series_name(&key),
            &p.json_country,
            self.style.stroke_width,
        )
    }
}

fn non_empty(series: Vec<Series>) -> Vec<Series> {
    series.into_iter().filter(|s| !s.is_empty()).collect()
}

fn flatten(series: &[Series]) -> Vec<SeriesPoint> {
    all_points(series).cloned().collect()
}

/// Every drug of one country.
#[derive(Debug, Clone)]
pub struct CountrySeriesChart {
    points: Track<PointKey, ElementId>,
    lines: Track<SeriesKey, ElementId>,
    axes: Axes<NaiveDate>,
    pub frame: Frame,
    pub paddings: Paddings,
    pub style: MarkStyle,
    pub ticks: TickCounts,
}

impl Default for CountrySeriesChart {
    fn default() -> Self {
        Self {
            points: Track::new("country_points"),
            lines: Track::new("country_lines"),
            axes: Axes::default(),
            frame: Frame::default(),
            paddings: Paddings::new(70.0, 95.0, 30.0, 15.0),
            style: MarkStyle {
                radius: 0.75,
                stroke_width: 0.2,
                font_size: 10.0,
                opacity: 1.0,
                duration_ms: 500,
            },
            ticks: TickCounts::new(4, 5),
        }
    }
}

impl CountrySeriesChart {
    /// Ticks of the last redraw.
    pub fn axes(&self) -> &Axes<NaiveDate> {
        &self.axes
    }

    pub fn points(&self) -> &Track<PointKey, ElementId> {
        &self.points
    }

    pub fn lines(&self) -> &Track<SeriesKey, ElementId> {
        &self.lines
    }

    /// Show `country` (a `StaticInfo::country` name), emphasizing `focus`.
    pub fn update<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        series: &[Series],
        country: &str,
        focus: Option<&str>,
        colors: OrdinalColor,
    ) -> Result<TimeSeriesReport> {
        let filter = SeriesFilter {
            country: Some(country),
            ..SeriesFilter::default()
        };
        let shown = non_empty(filter.series(series));
        let scales = country_scales(&shown, focus, self.frame, self.paddings, colors);
        let spec = self.style.spec();
        self.axes = series_axes(&scales, self.ticks);

        let points = PointEncoder {
            scales: &scales,
            style: self.style,
            focus,
            per_country: false,
        };
        let lines = LineEncoder {
            scales: &scales,
            style: self.style,
            focus,
            trend_hover: false,
        };
        Ok(TimeSeriesReport {
            points: reconcile_marks(&mut self.points, &flatten(&shown), surface, &points, spec)?,
            lines: reconcile_marks(&mut self.lines, &shown, surface, &lines, spec)?,
            labels: None,
        })
    }
}

/// Trends of several countries and drugs side by side.
#[derive(Debug, Clone)]
pub struct RegionSeriesChart {
    points: Track<PointKey, ElementId>,
    lines: Track<SeriesKey, ElementId>,
    labels: Track<PointKey, ElementId>,
    axes: Axes<NaiveDate>,
    pub frame: Frame,
    pub paddings: Paddings,
    pub style: MarkStyle,
    pub ticks: TickCounts,
}

impl Default for RegionSeriesChart {
    fn default() -> Self {
        Self {
            points: Track::new("region_points"),
            lines: Track::new("region_lines"),
            labels: Track::new("region_labels"),
            axes: Axes::default(),
            frame: Frame::default(),
            paddings: Paddings::new(75.0, 150.0, 50.0, 40.0),
            style: MarkStyle {
                radius: 0.8,
                stroke_width: 0.75,
                font_size: LABEL_FONT,
                opacity: 1.0,
                duration_ms: 500,
            },
            ticks: TickCounts::new(5, 9),
        }
    }
}

impl RegionSeriesChart {
    pub fn axes(&self) -> &Axes<NaiveDate> {
        &self.axes
    }

    pub fn points(&self) -> &Track<PointKey, ElementId> {
        &self.points
    }

    pub fn lines(&self) -> &Track<SeriesKey, ElementId> {
        &self.lines
    }

    pub fn labels(&self) -> &Track<PointKey, ElementId> {
        &self.labels
    }

    /// Show every selected drug of every selected country (geographic names).
    pub fn update<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        series: &[Series],
        countries: &[String],
        drugs: &[String],
        colors: OrdinalColor,
    ) -> Result<TimeSeriesReport> {
        let filter = SeriesFilter {
            countries: Some(countries),
            drugs: Some(drugs),
            ..SeriesFilter::default()
        };
        let shown = non_empty(filter.series(series));
        let scales = region_scales(&shown, self.frame, self.paddings, colors);
        let spec = self.style.spec();
        self.axes = series_axes(&scales, self.ticks);
        let ends: Vec<SeriesPoint> = shown.iter().filter_map(|s| s.last().cloned()).collect();

        let points = PointEncoder {
            scales: &scales,
            style: self.style,
            focus: None,
            per_country: true,
        };
        let lines = LineEncoder {
            scales: &scales,
            style: self.style,
            focus: None,
            trend_hover: true,
        };
        let labels = LabelEncoder {
            scales: &scales,
            style: self.style,
        };
        Ok(TimeSeriesReport {
            points: reconcile_marks(&mut self.points, &flatten(&shown), surface, &points, spec)?,
            lines: reconcile_marks(&mut self.lines, &shown, surface, &lines, spec)?,
            labels: Some(reconcile_marks(&mut self.labels, &ends, surface, &labels, spec)?),
        })
    }
}
