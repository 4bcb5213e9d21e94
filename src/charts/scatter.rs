//! Country/drug scatter for the MDS and local-regression views.
//!
//! Each mark is a text label (the country's iso3 code) colored by drug. The x axis runs right
//! to left.

use super::{Axes, Frame, MarkEncoder, MarkStyle, Paddings, TickCounts, placed, reconcile_marks};
use crate::error::Result;
use crate::hover::{self, HoverBinding};
use crate::models::{ScatterPoint, SeriesKey};
use crate::reconcile::{ReconcileReport, Track};
use crate::scale::{self, LinearScale, OrdinalColor, ScaleSet};
use crate::surface::{Attrs, ElementId, MarkKind, RenderSurface};

pub type ScatterScales = ScaleSet<LinearScale, LinearScale, OrdinalColor>;

/// Points whose drug and region are selected and, when given, whose year matches.
pub fn filter_scatter(
    points: &[ScatterPoint],
    drugs: &[String],
    regions: &[String],
    year: Option<i32>,
) -> Vec<ScatterPoint> {
    points
        .iter()
        .filter(|p| {
            drugs.contains(&p.drug)
                && p.region.as_ref().is_some_and(|r| regions.contains(r))
                && year.is_none_or(|y| p.year == Some(y))
        })
        .cloned()
        .collect()
}

pub fn scatter_scales(
    points: &[ScatterPoint],
    frame: Frame,
    paddings: Paddings,
    colors: OrdinalColor,
) -> ScatterScales {
    ScaleSet {
        x: scale::linear(points.iter().map(|p| p.x), paddings.x_range(frame)).reversed(),
        y: scale::linear(points.iter().map(|p| p.y), paddings.y_range(frame)),
        color: colors,
    }
}

struct LabelEncoder<'c> {
    scales: &'c ScatterScales,
    style: MarkStyle,
}

impl LabelEncoder<'_> {
    fn rest(&self) -> Attrs {
        Attrs {
            font_size: Some(self.style.font_size),
            opacity: Some(self.style.opacity),
            ..Attrs::default()
        }
    }

    fn placed(&self, p: &ScatterPoint) -> Attrs {
        Attrs {
            x: Some(self.scales.x.apply(p.x)),
            y: Some(self.scales.y.apply(p.y)),
            fill: Some(self.scales.color.color_or_neutral(&p.drug)),
            ..Attrs::default()
        }
    }
}

impl MarkEncoder<ScatterPoint> for LabelEncoder<'_> {
    type Key = SeriesKey;
    const KIND: MarkKind = MarkKind::Text;

    fn key(&self, p: &ScatterPoint) -> SeriesKey {
        SeriesKey::new(&p.drug, &p.country)
    }

    fn enter(&self, p: &ScatterPoint) -> Attrs {
        let mut attrs = self.placed(p).merged(&self.rest());
        attrs.text = Some(p.iso3.clone());
        attrs
    }

    fn target(&self, p: &ScatterPoint) -> Attrs {
        self.placed(p)
    }

    fn hover(&self, p: &ScatterPoint) -> Vec<HoverBinding> {
        let title = p.json_country.as_deref().unwrap_or(&p.country);
        hover::series_mark(
            &self.key(p).to_string(),
            &p.country,
            &p.drug,
            title,
            &self.rest(),
            self.style.duration_ms,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScatterChart {
    labels: Track<SeriesKey, ElementId>,
    axes: Axes<f64>,
    pub frame: Frame,
    pub paddings: Paddings,
    pub style: MarkStyle,
    pub ticks: TickCounts,
}

impl Default for ScatterChart {
    fn default() -> Self {
        Self {
            labels: Track::new("scatter"),
            axes: Axes::default(),
            frame: Frame::default(),
            paddings: Paddings::new(60.0, 20.0, 60.0, 20.0),
            style: MarkStyle {
                radius: 0.0,
                stroke_width: 0.0,
                font_size: 10.0,
                opacity: 0.6,
                duration_ms: 700,
            },
            ticks: TickCounts::new(10, 10),
        }
    }
}

impl ScatterChart {
    pub fn labels(&self) -> &Track<SeriesKey, ElementId> {
        &self.labels
    }

    /// Ticks of the last redraw.
    pub fn axes(&self) -> &Axes<f64> {
        &self.axes
    }

    pub fn axis_ticks(&self, scales: &ScatterScales) -> Axes<f64> {
        Axes {
            x: placed(scales.x.ticks(self.ticks.x), |v| scales.x.apply(v)),
            y: placed(scales.y.ticks(self.ticks.y), |v| scales.y.apply(v)),
        }
    }

    /// Redraw with an already filtered subset; scales are rebuilt from it.
    pub fn update<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        points: &[ScatterPoint],
        colors: OrdinalColor,
    ) -> Result<ReconcileReport<SeriesKey>> {
        let scales = scatter_scales(points, self.frame, self.paddings, colors);
        self.draw(surface, points, &scales)
    }

    pub fn draw<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        points: &[ScatterPoint],
        scales: &ScatterScales,
    ) -> Result<ReconcileReport<SeriesKey>> {
        let encoder = LabelEncoder {
            scales,
            style: self.style,
        };
        let spec = self.style.spec();
        self.axes = self.axis_ticks(scales);
        reconcile_marks(&mut self.labels, points, surface, &encoder, spec)
    }
}
