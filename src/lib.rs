//! incb_viz
//!
//! Data core of an interactive dashboard on international opioid consumption (milligrams per
//! person, per country, drug and year). Pairs with the `incb` CLI.
//!
//! ### Features
//! - Reshape nested per-country records into sorted series and flat points
//! - Within-bin ranks for cognostic dot histograms
//! - Linear, power, time, point, ordinal-color and threshold-color scales
//! - Keyed enter/update/exit reconciliation that keeps marks stable across redraws
//! - Map, scatter, histogram and time-series adapters over a pluggable rendering surface
//!
//! ### Example
//! ```no_run
//! use incb_viz::charts::map::{MapChart, MapRequest};
//! use incb_viz::{CountryProfile, GeoFeature, Scene, scale};
//!
//! let profiles: Vec<CountryProfile> = incb_viz::storage::load_json("incb.json")?;
//! let features: Vec<GeoFeature> = incb_viz::storage::load_json("features.json")?;
//! let colors = scale::drug_threshold("morphine")?;
//!
//! let mut scene = Scene::new();
//! let mut map = MapChart::default();
//! let req = MapRequest { features: &features, profiles: &profiles, drug: "morphine", year: 2010 };
//! map.update(&mut scene, &req, &colors)?;
//! scene.finish();
//! println!("{}", scene.to_json()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod charts;
pub mod cognostics;
pub mod config;
pub mod error;
pub mod hover;
pub mod models;
pub mod palette;
pub mod rank;
pub mod reconcile;
pub mod reshape;
pub mod scale;
pub mod storage;
pub mod surface;

pub use error::{Result, VizError};
pub use models::{
    CountryProfile, GeoFeature, HistogramPoint, PointKey, ScatterPoint, Series, SeriesKey,
    SeriesPoint,
};
pub use reconcile::{ReconcileReport, Track, Transition, TransitionSpec, VisualAdapter};
pub use surface::{RenderSurface, Scene};
