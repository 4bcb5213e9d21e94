//! Rendering surface boundary and an in-memory retained scene.
//!
//! Chart adapters talk to a [`RenderSurface`]: spawn a mark, animate it to new attributes,
//! bind hover records, destroy it. [`Scene`] is a complete in-memory implementation that keeps
//! the current attributes of every mark, interpolates animations on [`Scene::advance`] and
//! records every call it receives. It is what the CLI snapshots and what the tests inspect.

use crate::hover::{HoverBinding, HoverEffect, HoverPhase};
use crate::palette::Rgba;
use crate::reconcile::Transition;
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    /// Geographic region outline.
    Region,
    Circle,
    Text,
    /// Polyline through `points`.
    Path,
}

/// Visual attributes of a mark. Unset fields are left untouched when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    /// Opaque outline handed through from the geographic layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

macro_rules! overwrite_set {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field.clone();
            }
        )+
    };
}

impl Attrs {
    /// Overwrite every field that is set in `other`.
    pub fn merge(&mut self, other: &Attrs) {
        overwrite_set!(
            self,
            other,
            x,
            y,
            r,
            fill,
            stroke,
            stroke_width,
            opacity,
            fill_opacity,
            font_size,
            text,
            points,
            shape,
        );
    }

    pub fn merged(mut self, other: &Attrs) -> Attrs {
        self.merge(other);
        self
    }

    /// State at progress `t` between `from` and `to`.
    ///
    /// Numbers and colors are blended; paths are blended point-wise when both have the same
    /// number of points. Everything else takes the target value.
    pub fn lerp(from: &Attrs, to: &Attrs, t: f64) -> Attrs {
        let t = t.clamp(0.0, 1.0);
        let num = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(a + (b - a) * t),
            (a, b) => b.or(a),
        };
        let color = |a: Option<Rgba>, b: Option<Rgba>| match (a, b) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t)),
            (a, b) => b.or(a),
        };
        let points = match (&from.points, &to.points) {
            (Some(a), Some(b)) if a.len() == b.len() => Some(
                a.iter()
                    .zip(b)
                    .map(|(p, q)| [p[0] + (q[0] - p[0]) * t, p[1] + (q[1] - p[1]) * t])
                    .collect(),
            ),
            (a, b) => b.clone().or_else(|| a.clone()),
        };
        Attrs {
            x: num(from.x, to.x),
            y: num(from.y, to.y),
            r: num(from.r, to.r),
            fill: color(from.fill, to.fill),
            stroke: color(from.stroke, to.stroke),
            stroke_width: num(from.stroke_width, to.stroke_width),
            opacity: num(from.opacity, to.opacity),
            fill_opacity: num(from.fill_opacity, to.fill_opacity),
            font_size: num(from.font_size, to.font_size),
            text: to.text.clone().or_else(|| from.text.clone()),
            points,
            shape: to.shape.clone().or_else(|| from.shape.clone()),
        }
    }
}

/// Capabilities a chart needs from whatever draws it.
pub trait RenderSurface {
    /// Create a mark. `name` is the flattened key of the datum it represents.
    fn spawn(&mut self, kind: MarkKind, name: &str, attrs: Attrs) -> ElementId;

    /// Move a mark towards `attrs`. A timed call while a previous animation is still running
    /// replaces it, starting from wherever the mark currently is. An immediate call sets its
    /// fields at once and lets a running animation carry on with the rest.
    fn animate(&mut self, id: ElementId, attrs: Attrs, transition: Transition);

    fn bind_hover(&mut self, id: ElementId, bindings: Vec<HoverBinding>);

    /// Remove a mark, optionally fading it out first.
    fn destroy(&mut self, id: ElementId, transition: Option<Transition>);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Animation {
    pub from: Attrs,
    pub to: Attrs,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub elapsed_ms: u64,
}

impl Animation {
    fn progress(&self) -> f64 {
        if self.elapsed_ms < self.delay_ms {
            return 0.0;
        }
        if self.duration_ms == 0 {
            return 1.0;
        }
        ((self.elapsed_ms - self.delay_ms) as f64 / self.duration_ms as f64).min(1.0)
    }

    fn remaining_ms(&self) -> u64 {
        (self.delay_ms + self.duration_ms).saturating_sub(self.elapsed_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: ElementId,
    pub kind: MarkKind,
    pub name: String,
    pub attrs: Attrs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<HoverBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    /// Fading out; dropped once its animation completes.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exiting: bool,
}

/// One capability call received by a [`Scene`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    Spawn {
        id: ElementId,
        kind: MarkKind,
        name: String,
    },
    Animate {
        id: ElementId,
        transition: Transition,
    },
    BindHover {
        id: ElementId,
        bindings: usize,
    },
    Destroy {
        id: ElementId,
        transition: Option<Transition>,
    },
}

/// Retained in-memory [`RenderSurface`].
///
/// Every capability call is appended to an operation log that is never trimmed on its own, so
/// across redraws it keeps growing. Long-lived scenes should drain it with [`Scene::take_ops`]
/// after each update.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    next_id: u64,
    nodes: BTreeMap<ElementId, Node>,
    ops: Vec<SurfaceOp>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Live mark with the given name; marks that are fading out are skipped.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| !n.exiting && n.name == name)
    }

    pub fn count(&self, kind: MarkKind) -> usize {
        self.nodes
            .values()
            .filter(|n| !n.exiting && n.kind == kind)
            .count()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Hand over the operation log and start a fresh one.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn is_animating(&self) -> bool {
        self.nodes.values().any(|n| n.animation.is_some())
    }

    /// Let `ms` milliseconds of animation time pass.
    pub fn advance(&mut self, ms: u64) {
        let mut finished = Vec::new();
        for (id, node) in self.nodes.iter_mut() {
            let Some(anim) = node.animation.as_mut() else {
                continue;
            };
            anim.elapsed_ms = anim.elapsed_ms.saturating_add(ms);
            if anim.remaining_ms() > 0 {
                node.attrs = Attrs::lerp(&anim.from, &anim.to, anim.progress());
            } else {
                // land exactly on the target
                node.attrs = anim.to.clone();
                node.animation = None;
                if node.exiting {
                    finished.push(*id);
                }
            }
        }
        for id in finished {
            self.nodes.remove(&id);
        }
    }

    /// Run every pending animation to its end.
    pub fn finish(&mut self) {
        let remaining = self
            .nodes
            .values()
            .filter_map(|n| n.animation.as_ref())
            .map(Animation::remaining_ms)
            .max()
            .unwrap_or(0);
        self.advance(remaining);
    }

    /// Fire the hover bindings of a mark.
    ///
    /// Restyles are applied here; the returned effects are the ones the owner of the dashboard
    /// state has to act on.
    pub fn hover(&mut self, id: ElementId, phase: HoverPhase) -> Vec<HoverEffect> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let effects: Vec<HoverEffect> = node
            .hover
            .iter()
            .filter(|b| b.phase == phase)
            .map(|b| b.target_effect.clone())
            .collect();

        let mut forwarded = Vec::new();
        for effect in effects {
            match effect {
                HoverEffect::Restyle { attrs, duration_ms } => {
                    self.animate(id, attrs, Transition::millis(duration_ms));
                }
                HoverEffect::RestyleTarget {
                    target,
                    attrs,
                    duration_ms,
                } => {
                    let target_id = self.find(&target).map(|n| n.id);
                    match target_id {
                        Some(t) => self.animate(t, attrs, Transition::millis(duration_ms)),
                        None => debug!("hover target {target} not on the surface"),
                    }
                }
                other => forwarded.push(other),
            }
        }
        forwarded
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Scene {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&Node> = self.nodes.values().collect();
        let mut s = serializer.serialize_struct("Scene", 1)?;
        s.serialize_field("nodes", &nodes)?;
        s.end()
    }
}

impl RenderSurface for Scene {
    fn spawn(&mut self, kind: MarkKind, name: &str, attrs: Attrs) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                kind,
                name: name.to_string(),
                attrs,
                hover: Vec::new(),
                animation: None,
                exiting: false,
            },
        );
        self.ops.push(SurfaceOp::Spawn {
            id,
            kind,
            name: name.to_string(),
        });
        id
    }

    fn animate(&mut self, id: ElementId, attrs: Attrs, transition: Transition) {
        let Some(node) = self.nodes.get_mut(&id) else {
            debug!("animate: no element {id}");
            return;
        };
        if transition.is_immediate() {
            // an instant restyle leaves a running animation on its course for the other fields
            node.attrs.merge(&attrs);
            if let Some(running) = node.animation.as_mut() {
                running.from.merge(&attrs);
                running.to.merge(&attrs);
            }
        } else {
            // retarget from the current state; fields the new call leaves unset keep their old end
            let target = match node.animation.take() {
                Some(running) => running.to.merged(&attrs),
                None => node.attrs.clone().merged(&attrs),
            };
            node.animation = Some(Animation {
                from: node.attrs.clone(),
                to: target,
                duration_ms: transition.duration_ms,
                delay_ms: transition.delay_ms,
                elapsed_ms: 0,
            });
        }
        self.ops.push(SurfaceOp::Animate { id, transition });
    }

    fn bind_hover(&mut self, id: ElementId, bindings: Vec<HoverBinding>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        self.ops.push(SurfaceOp::BindHover {
            id,
            bindings: bindings.len(),
        });
        node.hover = bindings;
    }

    fn destroy(&mut self, id: ElementId, transition: Option<Transition>) {
        self.ops.push(SurfaceOp::Destroy { id, transition });
        match transition {
            Some(t) if !t.is_immediate() => {
                let fade = Attrs {
                    opacity: Some(0.0),
                    ..Attrs::default()
                };
                self.animate(id, fade, t);
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.exiting = true;
                }
            }
            _ => {
                self.nodes.remove(&id);
            }
        }
    }
}
