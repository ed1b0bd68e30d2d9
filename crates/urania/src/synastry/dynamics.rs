use super::pair::SynastryPair;
use crate::aspects::{AspectKind, ChartAspect};
use crate::western::Body;
use serde::{Deserialize, Serialize};

pub const HARMONY_THRESHOLD: f64 = 0.7;
pub const TENSION_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicKind {
    /// Pair compatibility at or above 0.7
    Harmony,
    /// Pair compatibility at or below 0.3
    Tension,
    /// Exact conjunction, square or opposition between the pair
    Catalyst,
    /// Jupiter or Venus harmonious to the other's Sun or Moon
    Support,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDynamic {
    pub kind: DynamicKind,
    pub participants: Vec<String>,
    /// Aspects that triggered this dynamic; empty for harmony and tension
    pub aspects: Vec<ChartAspect>,
    pub intensity: f64,
}

fn is_catalyst(aspect: &ChartAspect) -> bool {
    aspect.exact
        && matches!(
            aspect.kind,
            AspectKind::Conjunction | AspectKind::Square | AspectKind::Opposition
        )
}

fn is_support(aspect: &ChartAspect) -> bool {
    let benefic = |b: Body| matches!(b, Body::Jupiter | Body::Venus);
    aspect.kind.is_harmonious()
        && ((benefic(aspect.body_a) && aspect.body_b.is_luminary())
            || (benefic(aspect.body_b) && aspect.body_a.is_luminary()))
}

fn strongest(aspects: &[ChartAspect]) -> f64 {
    aspects.iter().map(|a| a.strength).fold(0.0, f64::max)
}

/// Dynamics per pair, in pair order then kind order.
pub fn group_dynamics(pairs: &[SynastryPair]) -> Vec<GroupDynamic> {
    let mut dynamics = Vec::new();
    for pair in pairs {
        let participants = vec![pair.person_a.clone(), pair.person_b.clone()];

        if pair.compatibility >= HARMONY_THRESHOLD {
            dynamics.push(GroupDynamic {
                kind: DynamicKind::Harmony,
                participants: participants.clone(),
                aspects: Vec::new(),
                intensity: pair.compatibility,
            });
        } else if pair.compatibility <= TENSION_THRESHOLD {
            dynamics.push(GroupDynamic {
                kind: DynamicKind::Tension,
                participants: participants.clone(),
                aspects: Vec::new(),
                intensity: 1.0 - pair.compatibility,
            });
        }

        for (kind, filter) in [
            (DynamicKind::Catalyst, is_catalyst as fn(&ChartAspect) -> bool),
            (DynamicKind::Support, is_support),
        ] {
            let aspects: Vec<ChartAspect> =
                pair.aspects.iter().filter(|a| filter(a)).copied().collect();
            if !aspects.is_empty() {
                dynamics.push(GroupDynamic {
                    kind,
                    participants: participants.clone(),
                    intensity: strongest(&aspects),
                    aspects,
                });
            }
        }
    }
    dynamics
}
