//! Threshold resolution and reading classification.
//!
//! Bounds for a measurement type are resolved from a plant's configuration in
//! a fixed order: the legacy per-type fields for the four built-in types, then
//! the first matching ideal range, then nothing. A reading is classified
//! against the resolved bounds into [`ReadingStatus`].
//!
//! # Example
//!
//! ```
//! use plantwatch_core::thresholds::{classify, resolve};
//! use plantwatch_types::{Bounds, MeasurementType, Plant, ReadingStatus};
//!
//! let plant = Plant::new(1, "Basil")
//!     .with_legacy(&MeasurementType::Temperature, Some(10.0), Some(20.0), Some("°C"));
//!
//! let bounds = resolve(&MeasurementType::Temperature, Some(&plant));
//! assert_eq!(bounds, Bounds::between(10.0, 20.0));
//!
//! assert_eq!(classify(15.0, bounds), ReadingStatus::Normal);
//! assert_eq!(classify(10.5, bounds), ReadingStatus::Attention);
//! assert_eq!(classify(25.0, bounds), ReadingStatus::Critical);
//! ```

use serde::{Deserialize, Serialize};

use plantwatch_types::{Bounds, MeasurementType, Plant, ReadingStatus};

/// Width of the warning band on each side, as a fraction of the range width.
pub const ATTENTION_MARGIN_RATIO: f64 = 0.1;

/// Where a set of resolved bounds came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsSource {
    /// The plant's legacy per-type fields.
    Legacy,
    /// An entry of the plant's ideal range list, by position.
    IdealRange(usize),
    /// Nothing configured.
    Unconfigured,
}

/// Bounds tagged with the configuration they were resolved from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBounds {
    /// The effective bounds.
    pub bounds: Bounds,
    /// Which configuration supplied them.
    pub source: BoundsSource,
}

impl ResolvedBounds {
    const UNCONFIGURED: ResolvedBounds = ResolvedBounds {
        bounds: Bounds::NONE,
        source: BoundsSource::Unconfigured,
    };
}

/// Resolve the effective bounds for `measurement` and record their source.
///
/// Built-in types use the legacy pair when either legacy bound is set. All
/// types then fall back to the first ideal range whose type matches. A
/// missing plant resolves to [`Bounds::NONE`].
#[must_use]
pub fn resolve_tagged(measurement: &MeasurementType, plant: Option<&Plant>) -> ResolvedBounds {
    let Some(plant) = plant else {
        return ResolvedBounds::UNCONFIGURED;
    };

    if let Some(legacy) = plant.legacy(measurement).filter(|l| l.has_bounds()) {
        return ResolvedBounds {
            bounds: legacy.bounds(),
            source: BoundsSource::Legacy,
        };
    }

    plant
        .ideal_ranges
        .iter()
        .position(|range| range.measurement.matches(measurement))
        .map(|index| ResolvedBounds {
            bounds: plant.ideal_ranges[index].bounds(),
            source: BoundsSource::IdealRange(index),
        })
        .unwrap_or(ResolvedBounds::UNCONFIGURED)
}

/// Resolve the effective bounds for `measurement` on `plant`.
#[must_use]
pub fn resolve(measurement: &MeasurementType, plant: Option<&Plant>) -> Bounds {
    resolve_tagged(measurement, plant).bounds
}

/// Classify a reading value against resolved bounds.
///
/// Out-of-range values are critical. When both bounds are set, values within
/// [`ATTENTION_MARGIN_RATIO`] of the range width from either edge (edges
/// included) need attention. Everything else, including NaN, is normal.
#[must_use]
pub fn classify(value: f64, bounds: Bounds) -> ReadingStatus {
    let below = bounds.min.is_some_and(|min| value < min);
    let above = bounds.max.is_some_and(|max| value > max);
    if below || above {
        return ReadingStatus::Critical;
    }

    if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
        let margin = (max - min) * ATTENTION_MARGIN_RATIO;
        if value <= min + margin || value >= max - margin {
            return ReadingStatus::Attention;
        }
    }

    ReadingStatus::Normal
}

/// A single bound crossed by a reading value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Breach {
    /// Value above the maximum.
    High {
        /// The reading value.
        value: f64,
        /// The crossed maximum.
        max: f64,
    },
    /// Value below the minimum.
    Low {
        /// The reading value.
        value: f64,
        /// The crossed minimum.
        min: f64,
    },
}

impl Breach {
    /// The reading value that caused the breach.
    pub fn value(&self) -> f64 {
        match self {
            Breach::High { value, .. } | Breach::Low { value, .. } => *value,
        }
    }

    /// Alert message in the form `"<label> alto: <value>"` or `"<label> baixo: <value>"`.
    pub fn message(&self, label: &str) -> String {
        match self {
            Breach::High { value, .. } => format!("{label} alto: {value}"),
            Breach::Low { value, .. } => format!("{label} baixo: {value}"),
        }
    }

    /// Alert message naming the sensor that reported the value.
    pub fn message_for_sensor(&self, label: &str, sensor_name: &str) -> String {
        match self {
            Breach::High { value, .. } => format!("{label} alta no sensor {sensor_name}: {value}"),
            Breach::Low { value, .. } => format!("{label} baixa no sensor {sensor_name}: {value}"),
        }
    }
}

/// Check each bound independently, high side first.
///
/// With `min <= max` at most one breach is returned.
#[must_use]
pub fn breaches(value: f64, bounds: Bounds) -> Vec<Breach> {
    let high = bounds
        .max
        .filter(|&max| value > max)
        .map(|max| Breach::High { value, max });
    let low = bounds
        .min
        .filter(|&min| value < min)
        .map(|min| Breach::Low { value, min });
    high.into_iter().chain(low).collect()
}
