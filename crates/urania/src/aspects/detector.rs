use crate::angle::circular_distance;
use crate::aspects::types::{AspectKind, ChartAspect, OrbTable, Placement};

/// Aspects tighter than this are flagged exact.
pub const EXACT_ORB: f64 = 1.0;

/// How far ahead (days) bodies are stepped to decide applying vs separating.
const APPLYING_STEP_DAYS: f64 = 1.0;

/// Best-matching aspect for one angular separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectMatch {
    pub kind: AspectKind,
    pub orb: f64,
    pub allowance: f64,
}

/// Finds the aspect formed by two longitudes.
#[derive(Debug, Clone, Default)]
pub struct AspectDetector {
    table: OrbTable,
}

impl AspectDetector {
    pub fn new(table: OrbTable) -> Self {
        Self { table }
    }

    pub fn major() -> Self {
        Self::new(OrbTable::major())
    }

    pub fn natal() -> Self {
        Self::new(OrbTable::natal())
    }

    pub fn table(&self) -> &OrbTable {
        &self.table
    }

    /// Allowed orb for `kind`, zero when the table does not track it.
    pub fn allowance(&self, kind: AspectKind) -> f64 {
        self.table.orb(kind).unwrap_or(0.0)
    }

    /// Aspect whose exact angle is closest to `separation`, if any lies within its orb.
    ///
    /// Overlapping orbs resolve to the smallest residual; equal residuals resolve to the
    /// aspect with the smaller exact angle.
    pub fn best_match(&self, separation: f64) -> Option<AspectMatch> {
        let mut best: Option<AspectMatch> = None;
        for rule in self.table.rules() {
            let orb = (separation - rule.kind.angle()).abs();
            if orb > rule.orb {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => orb < current.orb,
            };
            if better {
                best = Some(AspectMatch {
                    kind: rule.kind,
                    orb,
                    allowance: rule.orb,
                });
            }
        }
        best
    }

    /// Aspect between two placements.
    ///
    /// `applying` compares the current orb with the orb after stepping both bodies one day
    /// along their motion.
    pub fn detect(&self, a: &Placement, b: &Placement) -> Option<ChartAspect> {
        let separation = circular_distance(a.longitude, b.longitude);
        let found = self.best_match(separation)?;

        let future_separation = circular_distance(
            a.longitude + a.daily_motion * APPLYING_STEP_DAYS,
            b.longitude + b.daily_motion * APPLYING_STEP_DAYS,
        );
        let future_orb = (future_separation - found.kind.angle()).abs();

        let strength = if found.allowance > 0.0 {
            (1.0 - found.orb / found.allowance).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(ChartAspect {
            body_a: a.body,
            body_b: b.body,
            kind: found.kind,
            orb: found.orb,
            exact: found.orb < EXACT_ORB,
            applying: future_orb < found.orb,
            strength,
        })
    }

    /// Aspects among one set of placements, once per unordered pair, `body_a < body_b`.
    pub fn aspects_within(&self, placements: &[Placement]) -> Vec<ChartAspect> {
        let mut sorted: Vec<&Placement> = placements.iter().collect();
        sorted.sort_by_key(|p| p.body);
        sorted.dedup_by_key(|p| p.body);

        let mut aspects = Vec::new();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                if let Some(aspect) = self.detect(sorted[i], sorted[j]) {
                    aspects.push(aspect);
                }
            }
        }
        aspects
    }

    /// Full cross set: every placement in `left` against every placement in `right`.
    pub fn aspects_between(&self, left: &[Placement], right: &[Placement]) -> Vec<ChartAspect> {
        left.iter()
            .flat_map(|a| right.iter().filter_map(move |b| self.detect(a, b)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::western::Body;

    #[test]
    fn test_best_match_prefers_smallest_residual() {
        let table = OrbTable::major()
            .with_orb(AspectKind::Sextile, 20.0)
            .with_orb(AspectKind::Square, 20.0);
        let detector = AspectDetector::new(table);
        let found = detector.best_match(80.0).unwrap();
        assert_eq!(found.kind, AspectKind::Square);
        assert_eq!(found.orb, 10.0);
    }

    #[test]
    fn test_equal_residual_resolves_to_smaller_angle() {
        let table = OrbTable::major()
            .with_orb(AspectKind::Sextile, 20.0)
            .with_orb(AspectKind::Square, 20.0);
        let detector = AspectDetector::new(table);
        assert_eq!(detector.best_match(75.0).unwrap().kind, AspectKind::Sextile);
    }

    #[test]
    fn test_outside_every_orb() {
        let detector = AspectDetector::major();
        assert!(detector.best_match(40.0).is_none());
        assert!(detector.best_match(150.0).is_none());
        assert!(AspectDetector::natal().best_match(150.0).is_some());
    }

    #[test]
    fn test_applying_when_fast_body_closes_in() {
        let detector = AspectDetector::major();
        let moon = Placement::new(Body::Moon, 95.0, 13.0);
        let sun = Placement::new(Body::Sun, 100.0, 1.0);
        let aspect = detector.detect(&moon, &sun).unwrap();
        assert_eq!(aspect.kind, AspectKind::Conjunction);
        assert!(aspect.applying);

        let moon_past = Placement::new(Body::Moon, 105.0, 13.0);
        assert!(!detector.detect(&moon_past, &sun).unwrap().applying);
    }

    #[test]
    fn test_retrograde_motion_reverses_applying() {
        let detector = AspectDetector::major();
        let mercury = Placement::new(Body::Mercury, 105.0, -1.0);
        let sun = Placement::new(Body::Sun, 100.0, 1.0);
        assert!(detector.detect(&mercury, &sun).unwrap().applying);
    }
}
