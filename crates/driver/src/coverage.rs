use std::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Coverage instrumentation features requested with `-fsanitize-coverage=`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct CoverageFeatures: u16 {
        const FUNC               = 1 << 0;
        const BB                 = 1 << 1;
        const EDGE               = 1 << 2;
        const INDIRECT_CALLS     = 1 << 3;
        const TRACE_BB           = 1 << 4;
        const TRACE_CMP          = 1 << 5;
        const EIGHT_BIT_COUNTERS = 1 << 6;
        const TRACE_PC           = 1 << 7;
    }
}

static COVERAGE_FEATURES: &[(&str, CoverageFeatures)] = &[
    ("func", CoverageFeatures::FUNC),
    ("bb", CoverageFeatures::BB),
    ("edge", CoverageFeatures::EDGE),
    ("indirect-calls", CoverageFeatures::INDIRECT_CALLS),
    ("trace-bb", CoverageFeatures::TRACE_BB),
    ("trace-cmp", CoverageFeatures::TRACE_CMP),
    ("8bit-counters", CoverageFeatures::EIGHT_BIT_COUNTERS),
    ("trace-pc", CoverageFeatures::TRACE_PC),
];

impl CoverageFeatures {
    /// The mutually exclusive base features.
    pub const BASE: Self = Self::FUNC.union(Self::BB).union(Self::EDGE);

    /// Features that only make sense on top of a base feature.
    pub const NEEDS_BASE: Self = Self::TRACE_BB.union(Self::EIGHT_BIT_COUNTERS);

    pub fn from_feature_name(name: &str) -> Option<Self> {
        COVERAGE_FEATURES
            .iter()
            .find(|(feature, _)| *feature == name)
            .map(|(_, bits)| *bits)
    }

    /// Features selected by the deprecated integer form, together with the
    /// spelling that replaces it. Level 0 has no replacement.
    pub fn from_legacy_level(level: i64) -> Option<(Self, Option<&'static str>)> {
        let mapped = match level {
            0 => (Self::empty(), None),
            1 => (Self::FUNC, Some("-fsanitize-coverage=func")),
            2 => (Self::BB, Some("-fsanitize-coverage=bb")),
            3 => (Self::EDGE, Some("-fsanitize-coverage=edge")),
            4 => (
                Self::EDGE | Self::INDIRECT_CALLS,
                Some("-fsanitize-coverage=edge,indirect-calls"),
            ),
            _ => return None,
        };
        Some(mapped)
    }

    pub fn feature_names(self) -> impl Iterator<Item = &'static str> {
        COVERAGE_FEATURES
            .iter()
            .filter(move |(_, bits)| self.contains(*bits))
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for CoverageFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, name) in self.feature_names().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
