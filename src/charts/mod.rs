//! Chart adapters: turn a data subset into reconcile calls against a [`RenderSurface`].
//!
//! Every chart follows the same recipe. Build the scales from the subset being shown, then
//! hand each group of marks to its [`Track`] through a [`MarkEncoder`] that says how a datum
//! looks when it enters and where it should end up. Charts keep nothing but their tracks
//! between calls.

pub mod histogram;
pub mod map;
pub mod scatter;
pub mod timeseries;

use crate::error::Result;
use crate::hover::HoverBinding;
use crate::reconcile::{ReconcileReport, Track, Transition, TransitionSpec, VisualAdapter};
use crate::scale::{PixelRange, Tick};
use crate::surface::{Attrs, ElementId, MarkKind, RenderSurface};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Pixel size of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(600.0, 400.0)
    }
}

/// Space kept free between the plot area and the frame edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Paddings {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Paddings {
    pub const fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Left to right.
    pub fn x_range(&self, frame: Frame) -> PixelRange {
        (self.left, frame.width - self.right)
    }

    /// Bottom to top, so larger values sit higher.
    pub fn y_range(&self, frame: Frame) -> PixelRange {
        (frame.height - self.bottom, self.top)
    }
}

/// Base mark geometry and timing of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkStyle {
    pub radius: f64,
    pub stroke_width: f64,
    pub font_size: f64,
    pub opacity: f64,
    pub duration_ms: u64,
}

impl MarkStyle {
    pub fn transition(&self) -> Transition {
        Transition::millis(self.duration_ms)
    }

    /// Updates animate over the chart duration, exits are immediate.
    pub fn spec(&self) -> TransitionSpec {
        TransitionSpec::new(self.transition())
    }
}

/// How many ticks each axis asks its scale for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounts {
    pub x: usize,
    pub y: usize,
}

impl TickCounts {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Axis ticks for the scales of the latest redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes<X> {
    pub x: Vec<Tick<X>>,
    pub y: Vec<Tick<f64>>,
}

impl<X> Default for Axes<X> {
    fn default() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
        }
    }
}

fn placed<T: Copy>(values: Vec<T>, at: impl Fn(T) -> f64) -> Vec<Tick<T>> {
    values
        .into_iter()
        .map(|value| Tick {
            value,
            position: at(value),
        })
        .collect()
}

/// How one kind of datum is drawn.
pub trait MarkEncoder<D> {
    type Key: Eq + Hash + Clone + fmt::Display;
    const KIND: MarkKind;

    fn key(&self, datum: &D) -> Self::Key;

    /// Name of the element on the surface; hover targets address elements by it.
    fn name(&self, datum: &D) -> String {
        self.key(datum).to_string()
    }

    fn enter(&self, datum: &D) -> Attrs;

    fn target(&self, datum: &D) -> Attrs;

    fn hover(&self, _datum: &D) -> Vec<HoverBinding> {
        Vec::new()
    }
}

/// [`VisualAdapter`] backed by a [`RenderSurface`] and a [`MarkEncoder`].
pub struct SurfaceAdapter<'a, S, E> {
    surface: &'a mut S,
    encoder: &'a E,
}

impl<'a, S, E> SurfaceAdapter<'a, S, E> {
    pub fn new(surface: &'a mut S, encoder: &'a E) -> Self {
        Self { surface, encoder }
    }
}

impl<D, S, E> VisualAdapter<D> for SurfaceAdapter<'_, S, E>
where
    S: RenderSurface,
    E: MarkEncoder<D>,
{
    type Element = ElementId;
    type Pose = Attrs;

    fn initial_position(&self, datum: &D) -> Attrs {
        self.encoder.enter(datum)
    }

    fn create(&mut self, datum: &D, pose: Attrs) -> ElementId {
        let name = self.encoder.name(datum);
        self.surface.spawn(E::KIND, &name, pose)
    }

    fn handlers(&self, datum: &D) -> Vec<HoverBinding> {
        self.encoder.hover(datum)
    }

    fn attach_handlers(&mut self, element: &ElementId, bindings: Vec<HoverBinding>) {
        self.surface.bind_hover(*element, bindings);
    }

    fn transition_to(&mut self, element: &ElementId, datum: &D, transition: Transition) {
        let attrs = self.encoder.target(datum);
        self.surface.animate(*element, attrs, transition);
    }

    fn remove(&mut self, element: ElementId, transition: Option<Transition>) {
        self.surface.destroy(element, transition);
    }
}

/// Reconcile `data` into `track` through `encoder`.
pub fn reconcile_marks<D, S, E>(
    track: &mut Track<E::Key, ElementId>,
    data: &[D],
    surface: &mut S,
    encoder: &E,
    spec: TransitionSpec,
) -> Result<ReconcileReport<E::Key>>
where
    S: RenderSurface,
    E: MarkEncoder<D>,
{
    let mut adapter = SurfaceAdapter::new(surface, encoder);
    track.reconcile(data, |d| encoder.key(d), &mut adapter, spec)
}
