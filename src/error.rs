//! Error type shared by the reshaping, scale and reconciliation layers.

use thiserror::Error;

/// Failures raised by the library. Each one is local to the call that produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VizError {
    /// A drug's value array does not line up with the country's `years` array.
    #[error("{country}/{drug}: {values} values for {years} years")]
    LengthMismatch {
        country: String,
        drug: String,
        years: usize,
        values: usize,
    },

    /// Two data items produced the same key in a single reconciliation pass.
    #[error("duplicate key `{key}` in track `{track}`")]
    DuplicateKey { track: String, key: String },

    #[error("invalid year stamp: {0:?}")]
    InvalidYear(String),

    #[error("invalid color: {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    /// A threshold scale needs exactly one more color than it has breakpoints.
    #[error("threshold palette has {colors} colors for {breakpoints} breakpoints")]
    PaletteMismatch { breakpoints: usize, colors: usize },

    #[error("threshold breakpoints must be ascending")]
    UnsortedBreakpoints,

    #[error("no threshold palette configured for drug {0:?}")]
    UnknownDrug(String),

    #[error("palette is empty")]
    EmptyPalette,
}

pub type Result<T> = std::result::Result<T, VizError>;
