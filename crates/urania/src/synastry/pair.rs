use crate::aspects::{AspectDetector, ChartAspect};
use crate::chart::BirthChart;
use serde::{Deserialize, Serialize};

/// Divisor applied to the harmonious-minus-tense score before the sigmoid.
pub const COMPATIBILITY_SCALE: f64 = 3.0;

/// Cross aspects between two members and the resulting compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynastryPair {
    pub person_a: String,
    pub person_b: String,
    /// Every body of `person_a` against every body of `person_b`; `body_a` belongs to `person_a`
    pub aspects: Vec<ChartAspect>,
    pub harmonious_score: f64,
    pub tense_score: f64,
    /// In (0, 1); 0.5 when harmony and tension balance
    pub compatibility: f64,
}

/// Logistic squash of the net score into (0, 1).
pub fn compatibility(harmonious: f64, tense: f64) -> f64 {
    1.0 / (1.0 + (-(harmonious - tense) / COMPATIBILITY_SCALE).exp())
}

pub fn synastry_pair(a: &BirthChart, b: &BirthChart, detector: &AspectDetector) -> SynastryPair {
    let aspects = detector.aspects_between(&a.placements(), &b.placements());
    let harmonious_score: f64 = aspects
        .iter()
        .filter(|x| x.kind.is_harmonious())
        .map(|x| x.strength)
        .sum();
    let tense_score: f64 = aspects
        .iter()
        .filter(|x| x.kind.is_tense())
        .map(|x| x.strength)
        .sum();

    SynastryPair {
        person_a: a.owner_id.clone(),
        person_b: b.owner_id.clone(),
        compatibility: compatibility(harmonious_score, tense_score),
        aspects,
        harmonious_score,
        tense_score,
    }
}
