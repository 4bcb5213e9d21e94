//! Choropleth of one drug in one year.

use super::{MarkEncoder, reconcile_marks};
use crate::error::Result;
use crate::hover::{self, HoverBinding};
use crate::models::{CountryProfile, GeoFeature};
use crate::palette::{BASE_FILL, NEUTRAL_FILL, Rgba, STROKE};
use crate::reconcile::{ReconcileReport, Track, Transition, TransitionSpec};
use crate::reshape::{CountryLookup, build_country_index};
use crate::scale::ThresholdColor;
use crate::surface::{Attrs, ElementId, MarkKind, RenderSurface};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    pub stroke_width: f64,
    /// Fill opacity at rest; hovering raises it to 1.
    pub fill_opacity: f64,
    pub duration_ms: u64,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            stroke_width: 0.2,
            fill_opacity: 0.9,
            duration_ms: 1000,
        }
    }
}

/// Selection shown on the map.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    pub features: &'a [GeoFeature],
    pub profiles: &'a [CountryProfile],
    pub drug: &'a str,
    pub year: i32,
}

/// One geographic feature with whatever data matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRegion<'a> {
    pub feature: &'a GeoFeature,
    pub lookup: CountryLookup<'a>,
    pub value: Option<f64>,
}

impl MapRegion<'_> {
    /// Threshold color of the value; features without a profile or value get the neutral fill.
    pub fn fill(&self, colors: &ThresholdColor) -> Rgba {
        match self.lookup {
            CountryLookup::Found(_) => colors.color_for(self.value),
            CountryLookup::NoData => NEUTRAL_FILL,
        }
    }
}

/// Pair every feature with its profile and the value of `drug` in `year`.
pub fn map_regions<'a>(req: &MapRequest<'a>) -> Result<Vec<MapRegion<'a>>> {
    let index = build_country_index(req.profiles, req.features.iter().map(|f| f.name.as_str()));
    req.features
        .iter()
        .map(|feature| {
            let lookup = index.lookup(&feature.name);
            let value = match lookup.profile() {
                Some(p) => p.value_at(req.drug, req.year)?,
                None => None,
            };
            Ok(MapRegion {
                feature,
                lookup,
                value,
            })
        })
        .collect()
}

struct RegionEncoder<'c> {
    colors: &'c ThresholdColor,
    style: MapStyle,
}

impl<'a> MarkEncoder<MapRegion<'a>> for RegionEncoder<'_> {
    type Key = String;
    const KIND: MarkKind = MarkKind::Region;

    fn key(&self, region: &MapRegion<'a>) -> String {
        region.feature.name.clone()
    }

    fn enter(&self, region: &MapRegion<'a>) -> Attrs {
        Attrs {
            fill: Some(BASE_FILL),
            fill_opacity: Some(self.style.fill_opacity),
            stroke: Some(STROKE),
            stroke_width: Some(self.style.stroke_width),
            shape: region.feature.shape.clone(),
            ..Attrs::default()
        }
    }

    fn target(&self, region: &MapRegion<'a>) -> Attrs {
        Attrs {
            fill: Some(region.fill(self.colors)),
            ..Attrs::default()
        }
    }

    fn hover(&self, region: &MapRegion<'a>) -> Vec<HoverBinding> {
        let country = region.lookup.profile().map(|p| p.info.country.as_str());
        hover::map_region(&region.feature.name, country, self.style.fill_opacity)
    }
}

/// Map panel: one region element per geographic feature.
#[derive(Debug, Clone)]
pub struct MapChart {
    regions: Track<String, ElementId>,
    style: MapStyle,
}

impl Default for MapChart {
    fn default() -> Self {
        Self::new(MapStyle::default())
    }
}

impl MapChart {
    pub fn new(style: MapStyle) -> Self {
        Self {
            regions: Track::new("map"),
            style,
        }
    }

    pub fn regions(&self) -> &Track<String, ElementId> {
        &self.regions
    }

    /// Recolor the map for a drug and year.
    ///
    /// The first call creates every region with the base fill; later calls only move fills.
    pub fn update<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        req: &MapRequest<'_>,
        colors: &ThresholdColor,
    ) -> Result<ReconcileReport<String>> {
        let data = map_regions(req)?;
        let encoder = RegionEncoder {
            colors,
            style: self.style,
        };
        let spec = TransitionSpec::new(Transition::millis(self.style.duration_ms));
        reconcile_marks(&mut self.regions, &data, surface, &encoder, spec)
    }
}

/// Legend entries of the map color scale.
pub fn legend(colors: &ThresholdColor) -> Vec<(String, Rgba)> {
    colors.legend()
}
