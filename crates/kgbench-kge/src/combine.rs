//! Combination modes: which triple slots are fixed and which are expanded.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selector for how subject, predicate and object batches are combined.
///
/// The string forms (`"spo"`, `"sp_"`, `"_po"`, `"s_o"`) mark the expanded
/// slot with an underscore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combine {
    /// Row-aligned triples: row `i` scores `(s[i], p[i], o[i])`.
    #[serde(rename = "spo")]
    Spo,
    /// Every `(s[i], p[i])` pair against every object: `[n_sp, n_o]`.
    #[serde(rename = "sp_")]
    Sp,
    /// Every `(p[i], o[i])` pair against every subject: `[n_po, n_s]`.
    #[serde(rename = "_po")]
    Po,
    /// Every `(s[i], o[i])` pair against every predicate: `[n_so, n_p]`.
    #[serde(rename = "s_o")]
    So,
}

impl Combine {
    /// All modes, in canonical order.
    pub const ALL: [Combine; 4] = [Combine::Spo, Combine::Sp, Combine::Po, Combine::So];

    /// Canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spo => "spo",
            Self::Sp => "sp_",
            Self::Po => "_po",
            Self::So => "s_o",
        }
    }

    /// Whether one slot is expanded into a candidate batch.
    pub fn is_cross_product(&self) -> bool {
        !matches!(self, Self::Spo)
    }
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Combine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spo" => Ok(Self::Spo),
            "sp_" => Ok(Self::Sp),
            "_po" => Ok(Self::Po),
            "s_o" => Ok(Self::So),
            other => Err(Error::UnsupportedCombine(other.to_string())),
        }
    }
}
