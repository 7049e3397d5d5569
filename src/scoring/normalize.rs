//! Per-feature min/max normalization
//!
//! Calibration constants, not learned. Overridable per feature from config.

use crate::error::{EngineError, EngineResult};
use crate::features::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const UNIT: Bounds = Bounds { min: 0.0, max: 1.0 };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, feature: Feature) -> EngineResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(EngineError::InvalidInput(format!(
                "normalization bounds for {feature} need finite min < max (got {} .. {})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

fn default_bounds(feature: Feature) -> Bounds {
    match feature {
        Feature::AvgCommentLength => Bounds::new(0.0, 80.0),
        Feature::FunctionCount => Bounds::new(0.0, 20.0),
        Feature::ClassCount => Bounds::new(0.0, 10.0),
        Feature::MaxNestingDepth => Bounds::new(0.0, 8.0),
        Feature::ImportCount => Bounds::new(0.0, 15.0),
        Feature::CyclomaticComplexity => Bounds::new(1.0, 40.0),
        Feature::LineCount => Bounds::new(1.0, 400.0),
        Feature::TokenCount => Bounds::new(0.0, 3000.0),
        Feature::IndentWidthMode => Bounds::new(0.0, 8.0),
        Feature::IndentVariance => Bounds::new(0.0, 8.0),
        Feature::AvgDocLength => Bounds::new(0.0, 200.0),
        _ => Bounds::UNIT,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationBounds {
    bounds: [Bounds; Feature::COUNT],
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        let mut bounds = [Bounds::UNIT; Feature::COUNT];
        for f in Feature::ALL {
            bounds[f.index()] = default_bounds(f);
        }
        Self { bounds }
    }
}

impl NormalizationBounds {
    /// Defaults with per-feature overrides keyed by feature name
    pub fn with_overrides(overrides: &BTreeMap<String, Bounds>) -> EngineResult<Self> {
        let mut table = Self::default();
        for (name, bounds) in overrides {
            let feature = Feature::from_name(name).ok_or_else(|| {
                EngineError::InvalidInput(format!("unknown feature in normalization: {name}"))
            })?;
            bounds.validate(feature)?;
            table.bounds[feature.index()] = *bounds;
        }
        Ok(table)
    }

    pub fn get(&self, feature: Feature) -> Bounds {
        self.bounds[feature.index()]
    }

    /// Map a raw value into [0, 1]. Non-finite input maps to the feature's
    /// neutral value.
    pub fn normalize(&self, feature: Feature, value: f64) -> f64 {
        let value = if value.is_finite() {
            value
        } else {
            feature.neutral()
        };
        let Bounds { min, max } = self.get(feature);
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}
