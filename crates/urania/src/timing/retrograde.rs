use super::types::RetrogradeWindow;
use crate::houses::House;
use crate::transit::TransitState;
use crate::western::Body;
use std::collections::BTreeSet;

/// Contiguous retrograde runs per body across a time-ordered series of transit states.
///
/// Windows are ordered by body, then start.
pub fn retrograde_windows(timeline: &[TransitState]) -> Vec<RetrogradeWindow> {
    let bodies: BTreeSet<Body> = timeline
        .iter()
        .flat_map(|s| s.current_positions.keys().copied())
        .collect();

    let mut windows = Vec::new();
    for body in bodies {
        let mut open: Option<RetrogradeWindow> = None;
        for state in timeline {
            match state.current_positions.get(&body) {
                Some(p) if p.retrograde => match open.as_mut() {
                    Some(window) => {
                        window.end = state.ephemeris_instant;
                        push_house(&mut window.houses, p.house);
                    }
                    None => {
                        open = Some(RetrogradeWindow {
                            body,
                            start: state.ephemeris_instant,
                            end: state.ephemeris_instant,
                            houses: vec![p.house],
                        });
                    }
                },
                _ => {
                    if let Some(window) = open.take() {
                        windows.push(window);
                    }
                }
            }
        }
        if let Some(window) = open.take() {
            windows.push(window);
        }
    }
    windows
}

fn push_house(houses: &mut Vec<House>, house: House) {
    if !houses.contains(&house) {
        houses.push(house);
    }
}
