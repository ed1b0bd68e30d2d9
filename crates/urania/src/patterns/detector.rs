use super::types::{ChartPattern, PatternKind};
use crate::aspects::{AspectKind, ChartAspect};
use crate::houses::House;
use crate::western::Body;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Minimum number of bodies sharing a house to form a stellium.
pub const STELLIUM_MIN_BODIES: usize = 3;

/// Aspect lookup keyed by unordered body pair.
struct AspectIndex<'a> {
    edges: HashMap<(Body, Body), &'a ChartAspect>,
}

impl<'a> AspectIndex<'a> {
    fn new(aspects: &'a [ChartAspect]) -> Self {
        let mut edges = HashMap::new();
        for aspect in aspects {
            if aspect.body_a != aspect.body_b {
                edges.entry(key(aspect.body_a, aspect.body_b)).or_insert(aspect);
            }
        }
        Self { edges }
    }

    fn get(&self, a: Body, b: Body, kind: AspectKind) -> Option<&'a ChartAspect> {
        self.edges.get(&key(a, b)).copied().filter(|asp| asp.kind == kind)
    }

    fn has(&self, a: Body, b: Body, kind: AspectKind) -> bool {
        self.get(a, b, kind).is_some()
    }

    fn of_kind(&self, kind: AspectKind) -> Vec<(Body, Body)> {
        let mut pairs: Vec<(Body, Body)> = self
            .edges
            .iter()
            .filter(|(_, asp)| asp.kind == kind)
            .map(|(pair, _)| *pair)
            .collect();
        pairs.sort();
        pairs
    }

    fn strength(&self, edges: &[(Body, Body, AspectKind)]) -> f64 {
        let strengths: Vec<f64> = edges
            .iter()
            .filter_map(|&(a, b, kind)| self.get(a, b, kind))
            .map(|asp| asp.strength)
            .collect();
        mean_strength(&strengths)
    }
}

fn key(a: Body, b: Body) -> (Body, Body) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn mean_strength(strengths: &[f64]) -> f64 {
    if strengths.is_empty() {
        return 0.0;
    }
    (strengths.iter().sum::<f64>() / strengths.len() as f64).clamp(0.0, 1.0)
}

fn sorted(mut members: Vec<Body>) -> Vec<Body> {
    members.sort();
    members
}

/// Finds grand trines, T-squares, grand crosses, yods and stelliums.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

impl PatternDetector {
    pub fn new() -> Self {
        Self
    }

    /// Patterns in an aspect set. `houses` drives stellium detection.
    ///
    /// Output order is fixed: grand trines, T-squares, grand crosses, yods, stelliums, each group
    /// sorted by members.
    pub fn detect(
        &self,
        aspects: &[ChartAspect],
        houses: &BTreeMap<Body, House>,
    ) -> Vec<ChartPattern> {
        let index = AspectIndex::new(aspects);
        let bodies: Vec<Body> = aspects
            .iter()
            .flat_map(|a| [a.body_a, a.body_b])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let grand_crosses = self.grand_crosses(&index);
        let mut patterns = self.grand_trines(&index, &bodies);
        patterns.extend(self.t_squares(&index, &bodies, &grand_crosses));
        patterns.extend(grand_crosses);
        patterns.extend(self.yods(&index, &bodies));
        patterns.extend(self.stelliums(&index, houses));
        patterns
    }

    fn grand_trines(&self, index: &AspectIndex<'_>, bodies: &[Body]) -> Vec<ChartPattern> {
        let mut found = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if !index.has(bodies[i], bodies[j], AspectKind::Trine) {
                    continue;
                }
                for k in (j + 1)..bodies.len() {
                    let (a, b, c) = (bodies[i], bodies[j], bodies[k]);
                    if index.has(a, c, AspectKind::Trine) && index.has(b, c, AspectKind::Trine) {
                        found.push(ChartPattern {
                            kind: PatternKind::GrandTrine,
                            members: vec![a, b, c],
                            apex: None,
                            strength: index.strength(&[
                                (a, b, AspectKind::Trine),
                                (a, c, AspectKind::Trine),
                                (b, c, AspectKind::Trine),
                            ]),
                        });
                    }
                }
            }
        }
        found
    }

    fn grand_crosses(&self, index: &AspectIndex<'_>) -> Vec<ChartPattern> {
        let oppositions = index.of_kind(AspectKind::Opposition);
        let mut found = Vec::new();
        for i in 0..oppositions.len() {
            for j in (i + 1)..oppositions.len() {
                let (a, b) = oppositions[i];
                let (c, d) = oppositions[j];
                if a == c || a == d || b == c || b == d {
                    continue;
                }
                let squares = [(a, c), (a, d), (b, c), (b, d)];
                if !squares
                    .iter()
                    .all(|&(x, y)| index.has(x, y, AspectKind::Square))
                {
                    continue;
                }
                let mut edges = vec![
                    (a, b, AspectKind::Opposition),
                    (c, d, AspectKind::Opposition),
                ];
                edges.extend(squares.iter().map(|&(x, y)| (x, y, AspectKind::Square)));
                found.push(ChartPattern {
                    kind: PatternKind::GrandCross,
                    members: sorted(vec![a, b, c, d]),
                    apex: None,
                    strength: index.strength(&edges),
                });
            }
        }
        found.sort_by(|x, y| x.members.cmp(&y.members));
        found.dedup_by(|x, y| x.members == y.members);
        found
    }

    fn t_squares(
        &self,
        index: &AspectIndex<'_>,
        bodies: &[Body],
        grand_crosses: &[ChartPattern],
    ) -> Vec<ChartPattern> {
        let mut found = Vec::new();
        for (a, b) in index.of_kind(AspectKind::Opposition) {
            for &apex in bodies {
                if apex == a || apex == b {
                    continue;
                }
                if !(index.has(a, apex, AspectKind::Square) && index.has(b, apex, AspectKind::Square))
                {
                    continue;
                }
                let members = sorted(vec![a, b, apex]);
                let inside_cross = grand_crosses
                    .iter()
                    .any(|gc| members.iter().all(|m| gc.contains(*m)));
                if inside_cross {
                    continue;
                }
                found.push(ChartPattern {
                    kind: PatternKind::TSquare,
                    members,
                    apex: Some(apex),
                    strength: index.strength(&[
                        (a, b, AspectKind::Opposition),
                        (a, apex, AspectKind::Square),
                        (b, apex, AspectKind::Square),
                    ]),
                });
            }
        }
        found.sort_by(|x, y| x.members.cmp(&y.members));
        found
    }

    fn yods(&self, index: &AspectIndex<'_>, bodies: &[Body]) -> Vec<ChartPattern> {
        let mut found = Vec::new();
        for (a, b) in index.of_kind(AspectKind::Sextile) {
            for &apex in bodies {
                if apex == a || apex == b {
                    continue;
                }
                if index.has(a, apex, AspectKind::Quincunx)
                    && index.has(b, apex, AspectKind::Quincunx)
                {
                    found.push(ChartPattern {
                        kind: PatternKind::Yod,
                        members: sorted(vec![a, b, apex]),
                        apex: Some(apex),
                        strength: index.strength(&[
                            (a, b, AspectKind::Sextile),
                            (a, apex, AspectKind::Quincunx),
                            (b, apex, AspectKind::Quincunx),
                        ]),
                    });
                }
            }
        }
        found.sort_by(|x, y| x.members.cmp(&y.members));
        found
    }

    fn stelliums(
        &self,
        index: &AspectIndex<'_>,
        houses: &BTreeMap<Body, House>,
    ) -> Vec<ChartPattern> {
        let mut by_house: BTreeMap<House, Vec<Body>> = BTreeMap::new();
        for (&body, &house) in houses {
            by_house.entry(house).or_default().push(body);
        }

        let mut found: Vec<ChartPattern> = by_house
            .into_values()
            .filter(|members| members.len() >= STELLIUM_MIN_BODIES)
            .map(|members| {
                let members = sorted(members);
                let mut conjunctions = Vec::new();
                for i in 0..members.len() {
                    for j in (i + 1)..members.len() {
                        conjunctions.push((members[i], members[j], AspectKind::Conjunction));
                    }
                }
                ChartPattern {
                    kind: PatternKind::Stellium,
                    strength: index.strength(&conjunctions),
                    members,
                    apex: None,
                }
            })
            .collect();
        found.sort_by(|x, y| x.members.cmp(&y.members));
        found
    }
}
