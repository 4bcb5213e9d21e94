//! Dot histogram of one cognostic.
//!
//! Bins run bottom to top, dots are stacked left to right by their rank inside the bin.

use super::{Frame, MarkEncoder, MarkStyle, Paddings, reconcile_marks};
use crate::cognostics::visible_bin_domain;
use crate::error::Result;
use crate::hover::{self, HoverBinding};
use crate::models::{HistogramPoint, SeriesKey};
use crate::rank::rank_histogram;
use crate::reconcile::{ReconcileReport, Track};
use crate::scale::{self, LinearScale, OrdinalColor, PointScale, ScaleSet};
use crate::surface::{Attrs, ElementId, MarkKind, RenderSurface};

/// `x` maps ranks, `y` maps bin labels.
pub type HistogramScales = ScaleSet<LinearScale, PointScale, OrdinalColor>;

/// Scales for points that already carry their ranks.
pub fn histogram_scales(
    points: &[HistogramPoint],
    levels: &[String],
    frame: Frame,
    paddings: Paddings,
    colors: OrdinalColor,
) -> HistogramScales {
    let bins = visible_bin_domain(levels, points);
    ScaleSet {
        x: scale::linear(points.iter().map(|p| p.rank as f64), paddings.x_range(frame)),
        y: scale::ordinal_point(&bins, paddings.y_range(frame)),
        color: colors,
    }
}

struct DotEncoder<'c> {
    scales: &'c HistogramScales,
    style: MarkStyle,
}

impl DotEncoder<'_> {
    /// Bins missing from the axis sit on its first slot.
    fn bin_y(&self, bin: &str) -> f64 {
        self.scales
            .y
            .apply(bin)
            .unwrap_or_else(|| self.scales.y.range().0)
    }

    /// With a single rank on the axis every dot starts at the left edge.
    fn rank_x(&self, rank: usize) -> f64 {
        let x = &self.scales.x;
        if x.is_degenerate() {
            x.range().0
        } else {
            x.apply(rank as f64)
        }
    }
}

impl MarkEncoder<HistogramPoint> for DotEncoder<'_> {
    type Key = SeriesKey;
    const KIND: MarkKind = MarkKind::Circle;

    fn key(&self, p: &HistogramPoint) -> SeriesKey {
        p.series_id()
    }

    fn enter(&self, p: &HistogramPoint) -> Attrs {
        Attrs {
            r: Some(self.style.radius),
            x: Some(self.rank_x(0)),
            y: Some(self.bin_y(&p.bin)),
            fill: Some(self.scales.color.color_or_neutral(&p.series_key)),
            ..Attrs::default()
        }
    }

    fn target(&self, p: &HistogramPoint) -> Attrs {
        Attrs {
            x: Some(self.rank_x(p.rank)),
            y: Some(self.bin_y(&p.bin)),
            ..Attrs::default()
        }
    }

    fn hover(&self, p: &HistogramPoint) -> Vec<HoverBinding> {
        let rest = Attrs {
            r: Some(self.style.radius),
            opacity: Some(self.style.opacity),
            ..Attrs::default()
        };
        hover::series_mark(
            &self.key(p).to_string(),
            &p.group_key,
            &p.series_key,
            p.json_country.as_deref().unwrap_or(&p.group_key),
            &rest,
            self.style.duration_ms,
        )
    }
}

#[derive(Debug, Clone)]
pub struct HistogramChart {
    dots: Track<SeriesKey, ElementId>,
    pub frame: Frame,
    pub paddings: Paddings,
    pub style: MarkStyle,
}

impl Default for HistogramChart {
    fn default() -> Self {
        Self {
            dots: Track::new("histogram"),
            frame: Frame::default(),
            paddings: Paddings::new(70.0, 20.0, 20.0, 20.0),
            style: MarkStyle {
                radius: 2.0,
                stroke_width: 0.5,
                font_size: 10.0,
                opacity: 1.0,
                duration_ms: 500,
            },
        }
    }
}

impl HistogramChart {
    pub fn dots(&self) -> &Track<SeriesKey, ElementId> {
        &self.dots
    }

    /// Rank the filtered subset, rebuild the scales and redraw.
    ///
    /// `levels` is the full bin list of the cognostic; only the occupied span is laid out.
    pub fn update<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        points: &[HistogramPoint],
        levels: &[String],
        colors: OrdinalColor,
    ) -> Result<ReconcileReport<SeriesKey>> {
        let mut ranked = points.to_vec();
        rank_histogram(&mut ranked);
        let scales = histogram_scales(&ranked, levels, self.frame, self.paddings, colors);
        self.draw(surface, &ranked, &scales)
    }

    pub fn draw<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        points: &[HistogramPoint],
        scales: &HistogramScales,
    ) -> Result<ReconcileReport<SeriesKey>> {
        let encoder = DotEncoder {
            scales,
            style: self.style,
        };
        let spec = self.style.spec();
        reconcile_marks(&mut self.dots, points, surface, &encoder, spec)
    }
}
