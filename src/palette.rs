//! Named colors, drug palettes and milligram breakpoints used by the dashboard.
//!
//! Every default here can be overridden through [`crate::config::PaletteConfig`]; the scales
//! themselves never reach for these constants implicitly.
//!
//! - Drug colors: one categorical color per drug (ordinal scale range).
//! - Threshold ramps: eleven shades per drug, light to dark, one per milligram interval.
//! - Breakpoints: ten cutoffs, `0` then `10^seq(-2, 2, length = 8)` rounded, then `1000`.

use crate::error::{Result, VizError};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VizError::InvalidColor(s.to_string()));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| VizError::InvalidColor(s.into()))
        };
        let a = if digits.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Channel-wise blend, `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Lowercase hex form; alpha is only written when the color is not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RgbaVisitor;

        impl Visitor<'_> for RgbaVisitor {
            type Value = Rgba;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a hex color string like \"#e41a1c\"")
            }

            fn visit_str<E>(self, s: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Rgba::parse(s).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(RgbaVisitor)
    }
}

const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in palette constant"),
    }
}

/// Compile-time `#rrggbb` literal.
const fn hex(s: &str) -> Rgba {
    let b = s.as_bytes();
    assert!(b.len() == 7 && b[0] == b'#', "palette constants are #rrggbb");
    Rgba::rgb(
        nibble(b[1]) * 16 + nibble(b[2]),
        nibble(b[3]) * 16 + nibble(b[4]),
        nibble(b[5]) * 16 + nibble(b[6]),
    )
}

/// Fill for regions or marks that have no data behind them.
pub const NEUTRAL_FILL: Rgba = hex("#d3d3d3");
/// Background and initial fill of map regions.
pub const BASE_FILL: Rgba = hex("#f7f7f7");
pub const STROKE: Rgba = hex("#000000");

/// Drugs known to the dashboard, in legend order.
pub const DRUGS: [&str; 7] = [
    "oxycodone",
    "pethidine",
    "fentanyl",
    "morphine",
    "hydrocodone",
    "codeine",
    "total",
];

/// Categorical color per drug, parallel to [`DRUGS`].
pub const DRUG_COLORS: [Rgba; 7] = [
    hex("#e41a1c"),
    hex("#377eb8"),
    hex("#4daf4a"),
    hex("#984ea3"),
    hex("#e6550d"),
    hex("#1c9099"),
    hex("#ff59a4"),
];

/// Milligram-per-person cutoffs for the choropleth.
pub const MG_BREAKPOINTS: [f64; 10] = [
    0.0, 0.010, 0.037, 0.139, 0.518, 1.931, 7.197, 26.827, 100.0, 1000.0,
];

pub const OXYCODONE_RAMP: [Rgba; 11] = [
    hex("#ffded6"), hex("#ffbdae"), hex("#ff9c88"), hex("#fa7963"), hex("#f05340"),
    hex("#e41a1c"), hex("#bb1e19"), hex("#941e17"), hex("#6e1c14"), hex("#4b1710"),
    hex("#291109"),
];

pub const MORPHINE_RAMP: [Rgba; 11] = [
    hex("#efe1f0"), hex("#dec3e0"), hex("#cda5d1"), hex("#bc88c1"), hex("#aa6bb2"),
    hex("#984ea3"), hex("#7d4286"), hex("#63366a"), hex("#4b2a4f"), hex("#331f36"),
    hex("#1d131e"),
];

pub const PETHIDINE_RAMP: [Rgba; 11] = [
    hex("#e1e8f3"), hex("#c2d2e7"), hex("#a3bcdc"), hex("#84a7d0"), hex("#6192c4"),
    hex("#377eb8"), hex("#316897"), hex("#2b5377"), hex("#243e58"), hex("#1c2b3b"),
    hex("#131921"),
];

pub const FENTANYL_RAMP: [Rgba; 11] = [
    hex("#e3f2e0"), hex("#c7e5c1"), hex("#abd8a3"), hex("#8eca85"), hex("#6fbd68"),
    hex("#4daf4a"), hex("#42903f"), hex("#377133"), hex("#2c5428"), hex("#20391d"),
    hex("#152013"),
];

pub const HYDROCODONE_RAMP: [Rgba; 11] = [
    hex("#ffe3d6"), hex("#ffc8ae"), hex("#ffac87"), hex("#fa9061"), hex("#f1743b"),
    hex("#e6550d"), hex("#bd4810"), hex("#953b11"), hex("#6f2e11"), hex("#4b210f"),
    hex("#291509"),
];

pub const CODEINE_RAMP: [Rgba; 11] = [
    hex("#deeced"), hex("#bdd9dc"), hex("#9bc7cb"), hex("#78b4ba"), hex("#52a2a9"),
    hex("#1c9099"), hex("#1f777e"), hex("#1e5e63"), hex("#1c474a"), hex("#173033"),
    hex("#111c1d"),
];

pub const TOTAL_RAMP: [Rgba; 11] = [
    hex("#ffe1ec"), hex("#ffc2da"), hex("#ffa2c8"), hex("#ff80b6"), hex("#ff59a4"),
    hex("#ff1493"), hex("#d01e79"), hex("#a32060"), hex("#791e48"), hex("#501a31"),
    hex("#2b121c"),
];

/// Default threshold ramp for a drug, if one is defined.
pub fn threshold_ramp(drug: &str) -> Option<&'static [Rgba]> {
    let ramp: &'static [Rgba] = match drug {
        "oxycodone" => &OXYCODONE_RAMP,
        "morphine" => &MORPHINE_RAMP,
        "pethidine" => &PETHIDINE_RAMP,
        "fentanyl" => &FENTANYL_RAMP,
        "hydrocodone" => &HYDROCODONE_RAMP,
        "codeine" => &CODEINE_RAMP,
        "total" => &TOTAL_RAMP,
        _ => return None,
    };
    Some(ramp)
}

fn fmt_mg(v: f64) -> String {
    let a = v.abs();
    let prec = if a >= 100.0 {
        1
    } else if a >= 10.0 {
        2
    } else {
        3
    };
    format!("{:.*}", prec, v)
}

/// Legend labels for a threshold scale, one per color.
///
/// The first label names the lowest cutoff itself, the last one everything above the highest.
pub fn threshold_labels(breakpoints: &[f64]) -> Vec<String> {
    let Some((first, last)) = breakpoints.first().zip(breakpoints.last()) else {
        return Vec::new();
    };
    let mut labels = Vec::with_capacity(breakpoints.len() + 1);
    labels.push(first.to_string());
    for pair in breakpoints.windows(2) {
        labels.push(format!("{} - {}", fmt_mg(pair[0]), fmt_mg(pair[1])));
    }
    labels.push(format!(" > {}", fmt_mg(*last)));
    labels
}
