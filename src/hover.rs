//! Hover behavior as plain records.
//!
//! Instead of closures capturing page state, every mark carries a list of [`HoverBinding`]s.
//! The rendering surface applies the restyles itself and hands the remaining effects back to
//! whoever owns the dashboard state.

use crate::surface::Attrs;
use serde::Serialize;

/// Milliseconds of the short emphasis transitions used by trend lines and labels.
pub const EMPHASIS_MS: u64 = 50;

const TREND_LABEL_FONT: f64 = 14.0;
const TREND_LABEL_FONT_HOVER: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverPhase {
    Over,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum HoverEffect {
    /// Restyle the hovered element.
    Restyle { attrs: Attrs, duration_ms: u64 },
    /// Restyle another element, addressed by its flattened key.
    RestyleTarget {
        target: String,
        attrs: Attrs,
        duration_ms: u64,
    },
    /// Draw the time series of `country`, emphasizing `drug` (or the current selection).
    ShowCountrySeries {
        country: String,
        drug: Option<String>,
    },
    SetTitle { title: String },
}

impl HoverEffect {
    /// Whether the surface can apply the effect on its own.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            HoverEffect::Restyle { .. } | HoverEffect::RestyleTarget { .. }
        )
    }
}

/// One effect fired when the element with `source_key` enters or leaves the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverBinding {
    pub source_key: String,
    pub phase: HoverPhase,
    pub target_effect: HoverEffect,
}

impl HoverBinding {
    pub fn new(source_key: impl Into<String>, phase: HoverPhase, effect: HoverEffect) -> Self {
        Self {
            source_key: source_key.into(),
            phase,
            target_effect: effect,
        }
    }
}

/// Dot or label that opens a country's series panel.
///
/// On hover the mark grows (radius ×2, font ×1.5) and turns opaque; leaving restores `rest`.
pub fn series_mark(
    source_key: &str,
    country: &str,
    drug: &str,
    title: &str,
    rest: &Attrs,
    duration_ms: u64,
) -> Vec<HoverBinding> {
    let grown = Attrs {
        r: rest.r.map(|r| 2.0 * r),
        font_size: rest.font_size.map(|f| 1.5 * f),
        opacity: Some(1.0),
        ..Attrs::default()
    };
    let restored = Attrs {
        r: rest.r,
        font_size: rest.font_size,
        opacity: rest.opacity,
        ..Attrs::default()
    };
    vec![
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::Restyle {
                attrs: grown,
                duration_ms,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::ShowCountrySeries {
                country: country.to_string(),
                drug: Some(drug.to_string()),
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::SetTitle {
                title: title.to_string(),
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Out,
            HoverEffect::Restyle {
                attrs: restored,
                duration_ms,
            },
        ),
    ]
}

fn stroke(width: f64) -> Attrs {
    Attrs {
        stroke_width: Some(width),
        ..Attrs::default()
    }
}

fn font(size: f64) -> Attrs {
    Attrs {
        font_size: Some(size),
        ..Attrs::default()
    }
}

/// Trend line of the regions panel: thickens itself and enlarges its end label.
pub fn trend_line(
    source_key: &str,
    label_key: &str,
    title: &str,
    stroke_width: f64,
) -> Vec<HoverBinding> {
    vec![
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::Restyle {
                attrs: stroke(2.0 * stroke_width),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::SetTitle {
                title: title.to_string(),
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::RestyleTarget {
                target: label_key.to_string(),
                attrs: font(TREND_LABEL_FONT_HOVER),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Out,
            HoverEffect::Restyle {
                attrs: stroke(stroke_width),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Out,
            HoverEffect::RestyleTarget {
                target: label_key.to_string(),
                attrs: font(TREND_LABEL_FONT),
                duration_ms: EMPHASIS_MS,
            },
        ),
    ]
}

/// End-of-line label: enlarges itself and thickens its line.
pub fn trend_label(
    source_key: &str,
    line_key: &str,
    title: &str,
    stroke_width: f64,
) -> Vec<HoverBinding> {
    vec![
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::Restyle {
                attrs: font(TREND_LABEL_FONT_HOVER),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::RestyleTarget {
                target: line_key.to_string(),
                attrs: stroke(2.0 * stroke_width),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::SetTitle {
                title: title.to_string(),
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Out,
            HoverEffect::Restyle {
                attrs: font(TREND_LABEL_FONT),
                duration_ms: EMPHASIS_MS,
            },
        ),
        HoverBinding::new(
            source_key,
            HoverPhase::Out,
            HoverEffect::RestyleTarget {
                target: line_key.to_string(),
                attrs: stroke(stroke_width),
                duration_ms: EMPHASIS_MS,
            },
        ),
    ]
}

/// Map region: full opacity while hovered; regions with data open the country's series panel.
///
/// The drug is left to the controller, which knows the selection at hover time.
pub fn map_region(
    source_key: &str,
    country: Option<&str>,
    rest_opacity: f64,
) -> Vec<HoverBinding> {
    let fill_opacity = |v: f64| Attrs {
        fill_opacity: Some(v),
        ..Attrs::default()
    };
    let mut out = vec![HoverBinding::new(
        source_key,
        HoverPhase::Over,
        HoverEffect::Restyle {
            attrs: fill_opacity(1.0),
            duration_ms: 0,
        },
    )];
    if let Some(country) = country {
        out.push(HoverBinding::new(
            source_key,
            HoverPhase::Over,
            HoverEffect::ShowCountrySeries {
                country: country.to_string(),
                drug: None,
            },
        ));
    }
    out.push(HoverBinding::new(
        source_key,
        HoverPhase::Over,
        HoverEffect::SetTitle {
            title: source_key.to_string(),
        },
    ));
    out.push(HoverBinding::new(
        source_key,
        HoverPhase::Out,
        HoverEffect::Restyle {
            attrs: fill_opacity(rest_opacity),
            duration_ms: 0,
        },
    ));
    out
}
