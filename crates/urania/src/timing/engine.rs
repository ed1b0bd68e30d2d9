use super::lunar::{eclipses, find_lunations, lunar_cycle, LunarSample};
use super::retrograde::retrograde_windows;
use super::types::{
    CosmicSupportWindow, SacredTiming, SupportKind, TimingQuality, TimingRecommendation,
};
use crate::aspects::{AspectKind, ChartAspect};
use crate::cancel::CancelToken;
use crate::chart::BirthChart;
use crate::ephemeris::{EphemerisError, EphemerisProvider};
use crate::error::TimingError;
use crate::houses::House;
use crate::transit::{TransitState, TransitTracker};
use crate::western::Body;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 90;

const EXCELLENT_THRESHOLD: f64 = 0.75;
const GOOD_THRESHOLD: f64 = 0.5;
/// Extra days of lunar sampling past the horizon so the next lunation is always bracketed.
const LUNAR_MARGIN_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    pub horizon_days: u32,
    pub sample_interval_hours: u32,
    pub lunar_sample_hours: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            sample_interval_hours: 24,
            lunar_sample_hours: 6,
        }
    }
}

impl TimingSettings {
    pub fn validate(&self) -> Result<(), TimingError> {
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(TimingError::InvalidHorizon {
                days: self.horizon_days,
            });
        }
        Ok(())
    }

    fn sample_step(&self) -> Duration {
        Duration::hours(i64::from(self.sample_interval_hours.max(1)))
    }

    fn lunar_step(&self) -> Duration {
        Duration::hours(i64::from(self.lunar_sample_hours.max(1)))
    }
}

/// Per-house timing, support windows, lunar cycle, retrogrades and eclipses for one chart.
pub struct SacredTimingEngine<P> {
    provider: P,
    tracker: TransitTracker,
    settings: TimingSettings,
}

impl<P: EphemerisProvider> SacredTimingEngine<P> {
    pub fn new(provider: P, tracker: TransitTracker, settings: TimingSettings) -> Self {
        Self {
            provider,
            tracker,
            settings,
        }
    }

    pub fn settings(&self) -> &TimingSettings {
        &self.settings
    }

    /// Projects transits from `now` over the horizon and summarizes them.
    ///
    /// `current` is the user's published transit state; when absent it is computed for `now`.
    /// Nothing is committed. `cancel` is checked between samples.
    pub fn compute(
        &self,
        chart: &BirthChart,
        current: Option<&TransitState>,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<SacredTiming, TimingError> {
        self.settings.validate()?;
        let horizon_end = now + Duration::days(i64::from(self.settings.horizon_days));

        let current = match current {
            Some(state) => state.clone(),
            None => self.tracker.compute(chart, &self.provider.positions(now)?),
        };

        let projected = self.project(chart, now, horizon_end, cancel)?;
        let mut timeline = Vec::with_capacity(projected.len() + 1);
        timeline.push(current.clone());
        timeline.extend(projected.iter().cloned());

        let recommendations = recommendations(&current, &projected, now, horizon_end);
        let cosmic_support = cosmic_support(chart, &timeline);
        let retrograde_windows = retrograde_windows(&timeline);

        let lunar_samples = self.sample_lunar(now, horizon_end, cancel)?;
        let lunations = find_lunations(&lunar_samples);
        let lunar_cycle = lunar_cycle(chart, &lunar_samples, &lunations).ok_or(
            TimingError::Ephemeris(EphemerisError::MissingBody {
                body: Body::Moon,
                at: now,
            }),
        )?;
        let eclipse_windows = eclipses(chart, &lunations, horizon_end);

        log::debug!(
            "timing for {}: {} samples, {} support windows, {} retrograde windows, {} eclipses",
            chart.owner_id,
            projected.len(),
            cosmic_support.len(),
            retrograde_windows.len(),
            eclipse_windows.len()
        );

        Ok(SacredTiming {
            owner_id: chart.owner_id.clone(),
            generated_at: now,
            horizon_end,
            recommendations,
            cosmic_support,
            lunar_cycle,
            retrograde_windows,
            eclipse_windows,
        })
    }

    /// Transit states at each sample after `now` up to `until`, computed but not committed.
    pub fn project(
        &self,
        chart: &BirthChart,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<Vec<TransitState>, TimingError> {
        let step = self.settings.sample_step();
        let mut states = Vec::new();
        let mut at = now + step;
        while at <= until {
            if cancel.is_cancelled() {
                return Err(TimingError::Cancelled);
            }
            let snapshot = self.provider.positions(at)?;
            states.push(self.tracker.compute(chart, &snapshot));
            at += step;
        }
        Ok(states)
    }

    fn sample_lunar(
        &self,
        now: DateTime<Utc>,
        horizon_end: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<Vec<LunarSample>, TimingError> {
        let span_end = horizon_end.max(now + Duration::days(30)) + Duration::days(LUNAR_MARGIN_DAYS);
        let step = self.settings.lunar_step();
        let mut samples = Vec::new();
        let mut at = now;
        while at <= span_end {
            if cancel.is_cancelled() {
                return Err(TimingError::Cancelled);
            }
            let snapshot = self.provider.positions(at)?;
            // Providers without the Sun or Moon leave gaps; an empty series fails below.
            samples.extend(LunarSample::from_snapshot(&snapshot));
            at += step;
        }
        Ok(samples)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn is_trine_or_sextile(kind: AspectKind) -> bool {
    matches!(kind, AspectKind::Trine | AspectKind::Sextile)
}

fn recommendations(
    current: &TransitState,
    projected: &[TransitState],
    now: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
) -> Vec<TimingRecommendation> {
    House::all()
        .map(|house| {
            let current_activation = current.activation(house);
            let projected_activation =
                mean(projected.iter().map(|s| s.activation(house))).unwrap_or(current_activation);
            let blended = 0.5 * current_activation + 0.5 * projected_activation;

            let mut harmonious = 0u32;
            let mut trine_or_sextile = 0u32;
            let mut challenging = 0u32;
            let mut planets = BTreeSet::new();
            for state in std::iter::once(current).chain(projected.iter()) {
                planets.extend(state.transits_in(house));
                for aspect in state.aspects_from(house) {
                    if aspect.kind.is_harmonious() {
                        harmonious += 1;
                    }
                    if is_trine_or_sextile(aspect.kind) {
                        trine_or_sextile += 1;
                    }
                    if aspect.kind.is_tense() && aspect.body_b.is_luminary() {
                        challenging += 1;
                    }
                }
            }

            let quality = if challenging > harmonious {
                TimingQuality::Challenging
            } else if blended >= EXCELLENT_THRESHOLD && trine_or_sextile >= 1 {
                TimingQuality::Excellent
            } else if blended >= GOOD_THRESHOLD {
                TimingQuality::Good
            } else {
                TimingQuality::Neutral
            };

            TimingRecommendation {
                house,
                quality,
                current_activation,
                projected_activation,
                blended_activation: blended,
                harmonious_aspects: harmonious,
                challenging_aspects: challenging,
                planets: planets.into_iter().collect(),
                start: now,
                end: horizon_end,
            }
        })
        .collect()
}

/// Support kind an aspect contributes, if any.
fn support_kind(aspect: &ChartAspect) -> Option<SupportKind> {
    match aspect.body_a {
        Body::Jupiter if aspect.kind.is_harmonious() => Some(SupportKind::Breakthrough),
        Body::Venus if aspect.kind.is_harmonious() => Some(SupportKind::Integration),
        Body::Neptune | Body::Pluto if is_trine_or_sextile(aspect.kind) => {
            Some(SupportKind::Release)
        }
        Body::Mars | Body::Uranus
            if aspect.kind == AspectKind::Conjunction && aspect.body_b.is_luminary() =>
        {
            Some(SupportKind::Initiation)
        }
        _ => None,
    }
}

fn cosmic_support(chart: &BirthChart, timeline: &[TransitState]) -> Vec<CosmicSupportWindow> {
    let mut open: BTreeMap<SupportKind, CosmicSupportWindow> = BTreeMap::new();
    let mut closed = Vec::new();

    for state in timeline {
        let mut active: BTreeMap<SupportKind, (f64, BTreeSet<House>)> = BTreeMap::new();
        for aspect in &state.active_aspects {
            if let Some(kind) = support_kind(aspect) {
                let entry = active.entry(kind).or_insert((0.0, BTreeSet::new()));
                entry.0 = entry.0.max(aspect.strength);
                if let Some(natal) = chart.positions.get(&aspect.body_b) {
                    entry.1.insert(natal.house);
                }
            }
        }

        let ended: Vec<SupportKind> = open
            .keys()
            .filter(|k| !active.contains_key(k))
            .copied()
            .collect();
        for kind in ended {
            if let Some(window) = open.remove(&kind) {
                closed.push(window);
            }
        }

        for (kind, (intensity, houses)) in active {
            let window = open.entry(kind).or_insert_with(|| CosmicSupportWindow {
                kind,
                start: state.ephemeris_instant,
                end: state.ephemeris_instant,
                intensity: 0.0,
                supported_houses: Vec::new(),
            });
            window.end = state.ephemeris_instant;
            window.intensity = window.intensity.max(intensity);
            for house in houses {
                if !window.supported_houses.contains(&house) {
                    window.supported_houses.push(house);
                }
            }
        }
    }
    closed.extend(open.into_values());

    for window in &mut closed {
        window.supported_houses.sort();
    }
    closed.sort_by(|a, b| a.start.cmp(&b.start).then(a.kind.cmp(&b.kind)));
    closed
}
