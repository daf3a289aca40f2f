//! Crop condition evaluator.
//!
//! Each index carries an ordered list of `(threshold, label)` breakpoints and a
//! direction. For `Higher` indices the list is strictly decreasing and a value
//! takes the first label whose threshold it reaches (`value >= threshold`); for
//! `Lower` indices the list is strictly increasing and the comparison is
//! `value <= threshold`. Every list ends with an infinite catch-all.

use serde::Serialize;

/// Which end of the scale is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

/// Display class of a label; ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionClass {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    Neutral,
}

impl ConditionClass {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Excellent" | "Optimal" | "Wet" => ConditionClass::Excellent,
            "Good" | "Normal" => ConditionClass::Good,
            "Fair" => ConditionClass::Fair,
            "Poor" | "Warm" | "Dry" | "Very Dry" => ConditionClass::Poor,
            "Critical" => ConditionClass::Critical,
            _ => ConditionClass::Neutral,
        }
    }

    /// 0 = best, 4 = worst; `None` for the neutral class.
    pub fn severity(&self) -> Option<u8> {
        match self {
            ConditionClass::Excellent => Some(0),
            ConditionClass::Good => Some(1),
            ConditionClass::Fair => Some(2),
            ConditionClass::Poor => Some(3),
            ConditionClass::Critical => Some(4),
            ConditionClass::Neutral => None,
        }
    }
}

/// Result of classifying one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub label: &'static str,
    pub class: ConditionClass,
}

impl Condition {
    pub const NO_DATA: Condition = Condition {
        label: "No data",
        class: ConditionClass::Neutral,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub direction: Direction,
    pub levels: &'static [(f64, &'static str)],
}

const fn higher(levels: &'static [(f64, &'static str)]) -> Thresholds {
    Thresholds {
        direction: Direction::Higher,
        levels,
    }
}

const fn lower(levels: &'static [(f64, &'static str)]) -> Thresholds {
    Thresholds {
        direction: Direction::Lower,
        levels,
    }
}

const NEG: f64 = f64::NEG_INFINITY;
const POS: f64 = f64::INFINITY;

static TABLE: &[(&str, Thresholds)] = &[
    ("NDVI", higher(&[(0.70, "Excellent"), (0.50, "Good"), (0.30, "Fair"), (0.10, "Poor"), (NEG, "Critical")])),
    ("NDRE", higher(&[(0.50, "Excellent"), (0.30, "Good"), (0.20, "Fair"), (0.10, "Poor"), (NEG, "Critical")])),
    ("GNDVI", higher(&[(0.60, "Excellent"), (0.40, "Good"), (0.30, "Fair"), (0.15, "Poor"), (NEG, "Critical")])),
    ("EVI", higher(&[(0.60, "Excellent"), (0.40, "Good"), (0.20, "Fair"), (0.10, "Poor"), (NEG, "Critical")])),
    ("SAVI", higher(&[(0.60, "Excellent"), (0.40, "Good"), (0.20, "Fair"), (0.10, "Poor"), (NEG, "Critical")])),
    ("CIre", higher(&[(6.0, "Excellent"), (4.0, "Good"), (2.0, "Fair"), (1.0, "Poor"), (NEG, "Critical")])),
    ("MTCI", higher(&[(4.0, "Excellent"), (3.0, "Good"), (2.0, "Fair"), (1.0, "Poor"), (NEG, "Critical")])),
    ("IRECI", higher(&[(2.0, "Excellent"), (1.5, "Good"), (0.8, "Fair"), (0.3, "Poor"), (NEG, "Critical")])),
    ("NDMI", higher(&[(0.30, "Excellent"), (0.10, "Good"), (0.0, "Fair"), (-0.2, "Poor"), (NEG, "Critical")])),
    ("NMDI", higher(&[(0.70, "Excellent"), (0.50, "Good"), (0.30, "Fair"), (0.10, "Poor"), (NEG, "Critical")])),
    ("LST", lower(&[(25.0, "Optimal"), (30.0, "Good"), (35.0, "Fair"), (40.0, "Warm"), (POS, "Critical")])),
    ("VSWI", higher(&[(0.04, "Excellent"), (0.03, "Good"), (0.02, "Fair"), (0.01, "Poor"), (NEG, "Critical")])),
    ("TVDI", lower(&[(0.30, "Wet"), (0.50, "Normal"), (0.70, "Dry"), (0.85, "Very Dry"), (POS, "Critical")])),
    ("TCI", higher(&[(80.0, "Excellent"), (60.0, "Good"), (40.0, "Fair"), (20.0, "Poor"), (NEG, "Critical")])),
    ("VHI", higher(&[(60.0, "Excellent"), (40.0, "Good"), (30.0, "Fair"), (20.0, "Poor"), (NEG, "Critical")])),
];

/// Breakpoints for an index, if it has any.
pub fn thresholds(index: &str) -> Option<&'static Thresholds> {
    TABLE.iter().find(|(id, _)| *id == index).map(|(_, t)| t)
}

/// Classify a value. Unknown indices and null values are "no data".
pub fn evaluate(index: &str, value: Option<f64>) -> Condition {
    let (Some(table), Some(value)) = (thresholds(index), value) else {
        return Condition::NO_DATA;
    };

    let hit = table.levels.iter().find(|(threshold, _)| match table.direction {
        Direction::Higher => value >= *threshold,
        Direction::Lower => value <= *threshold,
    });

    match hit {
        Some(&(_, label)) => Condition {
            label,
            class: ConditionClass::from_label(label),
        },
        // NaN compares false against every breakpoint
        None => Condition::NO_DATA,
    }
}
