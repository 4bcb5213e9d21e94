//! Palette overrides.
//!
//! Read from a JSON object; every field is optional and falls back to the named defaults in
//! [`crate::palette`]:
//!
//! ```json
//! { "drugs": ["morphine", "codeine"], "drug_colors": ["#984ea3", "#1c9099"],
//!   "breakpoints": [0, 1, 10],
//!   "ramps": { "morphine": ["#eeeeee", "#aaaaaa", "#666666", "#222222"] } }
//! ```

use crate::error::{Result, VizError};
use crate::palette::{self, Rgba};
use crate::scale::{self, OrdinalColor, ThresholdColor};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Drug order of the categorical color scale.
    pub drugs: Vec<String>,
    pub drug_colors: Vec<Rgba>,
    /// Milligram cutoffs of the map color scale.
    pub breakpoints: Vec<f64>,
    /// Per-drug threshold ramps; drugs without an entry use the built-in ramp.
    pub ramps: BTreeMap<String, Vec<Rgba>>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            drugs: palette::DRUGS.iter().map(|d| d.to_string()).collect(),
            drug_colors: palette::DRUG_COLORS.to_vec(),
            breakpoints: palette::MG_BREAKPOINTS.to_vec(),
            ramps: BTreeMap::new(),
        }
    }
}

impl PaletteConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn drug_colors(&self) -> Result<OrdinalColor> {
        scale::ordinal_color(&self.drugs, &self.drug_colors)
    }

    /// Threshold scale for one drug over the configured breakpoints.
    pub fn threshold_for(&self, drug: &str) -> Result<ThresholdColor> {
        let ramp = match self.ramps.get(drug) {
            Some(r) => r.as_slice(),
            None => palette::threshold_ramp(drug)
                .ok_or_else(|| VizError::UnknownDrug(drug.into()))?,
        };
        scale::threshold_color(&self.breakpoints, ramp)
    }
}
