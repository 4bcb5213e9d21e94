//! Keyed enter/update/exit reconciliation.
//!
//! A [`Track`] remembers which visual element it created for every key. Each call to
//! [`Track::reconcile`] diffs the new data against that mapping and drives a
//! [`VisualAdapter`]: new keys are created, vanished keys removed, and every surviving or new
//! element is transitioned to the state of its datum. Elements of unchanged keys are never
//! recreated, which is what keeps a mark visually stable across redraws.

use crate::error::{Result, VizError};
use crate::hover::HoverBinding;
use ahash::{AHashMap, AHashSet};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

/// Timing of one animated change. A zero duration without delay applies immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Transition {
    pub duration_ms: u64,
    pub delay_ms: u64,
}

impl Transition {
    pub const IMMEDIATE: Transition = Transition {
        duration_ms: 0,
        delay_ms: 0,
    };

    pub const fn millis(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            delay_ms: 0,
        }
    }

    pub const fn delayed(self, delay_ms: u64) -> Self {
        Self {
            duration_ms: self.duration_ms,
            delay_ms,
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.duration_ms == 0 && self.delay_ms == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Transitions of one reconcile call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionSpec {
    /// Applied to entering and updated elements.
    pub update: Transition,
    /// Fade-out before removal; `None` removes at once.
    pub exit: Option<Transition>,
}

impl TransitionSpec {
    pub const fn new(update: Transition) -> Self {
        Self { update, exit: None }
    }

    pub const fn with_exit(mut self, exit: Transition) -> Self {
        self.exit = Some(exit);
        self
    }
}

/// What a reconciler needs from a rendering backend for one kind of mark.
pub trait VisualAdapter<D> {
    /// Handle of a created element.
    type Element;
    /// Starting state of a freshly created element.
    type Pose;

    fn initial_position(&self, datum: &D) -> Self::Pose;

    fn create(&mut self, datum: &D, pose: Self::Pose) -> Self::Element;

    /// Hover behavior of the element created for `datum`.
    fn handlers(&self, _datum: &D) -> Vec<HoverBinding> {
        Vec::new()
    }

    fn attach_handlers(&mut self, _element: &Self::Element, _bindings: Vec<HoverBinding>) {}

    fn transition_to(&mut self, element: &Self::Element, datum: &D, transition: Transition);

    fn remove(&mut self, element: Self::Element, transition: Option<Transition>);
}

/// Keys touched by one reconcile call, each list in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport<K> {
    /// New keys, in data order.
    pub entered: Vec<K>,
    /// Surviving keys, in data order.
    pub updated: Vec<K>,
    /// Removed keys, in the order of the previous call's data.
    pub exited: Vec<K>,
}

impl<K> Default for ReconcileReport<K> {
    fn default() -> Self {
        Self {
            entered: Vec::new(),
            updated: Vec::new(),
            exited: Vec::new(),
        }
    }
}

impl<K> ReconcileReport<K> {
    /// No element was created or removed.
    pub fn is_stable(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Key → element mapping of one group of marks, retained across redraws.
#[derive(Debug, Clone)]
pub struct Track<K, E> {
    name: String,
    elements: AHashMap<K, E>,
    order: Vec<K>,
}

impl<K, E> Track<K, E>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: AHashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&E> {
        self.elements.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.elements.contains_key(key)
    }

    /// Keys in the order of the most recent data.
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Bring the track in line with `data`.
    ///
    /// Keys must be unique within `data`; a repeated key fails the whole call with
    /// [`VizError::DuplicateKey`] before anything is created, removed or moved.
    pub fn reconcile<D, A, F>(
        &mut self,
        data: &[D],
        key_fn: F,
        adapter: &mut A,
        spec: TransitionSpec,
    ) -> Result<ReconcileReport<K>>
    where
        A: VisualAdapter<D, Element = E>,
        F: Fn(&D) -> K,
    {
        let keys: Vec<K> = data.iter().map(&key_fn).collect();
        let mut incoming: AHashSet<&K> = AHashSet::with_capacity(keys.len());
        for key in &keys {
            if !incoming.insert(key) {
                return Err(VizError::DuplicateKey {
                    track: self.name.clone(),
                    key: key.to_string(),
                });
            }
        }

        let mut report = ReconcileReport::default();

        for key in &self.order {
            if incoming.contains(key) {
                continue;
            }
            if let Some(element) = self.elements.remove(key) {
                adapter.remove(element, spec.exit);
                report.exited.push(key.clone());
            }
        }

        for (datum, key) in data.iter().zip(&keys) {
            if self.elements.contains_key(key) {
                report.updated.push(key.clone());
                continue;
            }
            let pose = adapter.initial_position(datum);
            let element = adapter.create(datum, pose);
            let bindings = adapter.handlers(datum);
            if !bindings.is_empty() {
                adapter.attach_handlers(&element, bindings);
            }
            self.elements.insert(key.clone(), element);
            report.entered.push(key.clone());
        }

        for (datum, key) in data.iter().zip(&keys) {
            if let Some(element) = self.elements.get(key) {
                adapter.transition_to(element, datum, spec.update);
            }
        }

        debug!(
            "track {}: {} entered, {} updated, {} exited",
            self.name,
            report.entered.len(),
            report.updated.len(),
            report.exited.len()
        );
        self.order = keys;
        Ok(report)
    }
}
