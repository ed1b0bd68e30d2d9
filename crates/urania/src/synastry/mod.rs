//! Group analysis: composite chart, pairwise synastry and group dynamics.

pub mod composite;
pub mod dynamics;
pub mod pair;

pub use composite::{composite_chart, CompositeChart, CompositePlacement};
pub use dynamics::{group_dynamics, DynamicKind, GroupDynamic};
pub use pair::{compatibility, synastry_pair, SynastryPair};

use crate::aspects::AspectDetector;
use crate::cancel::CancelToken;
use crate::chart::BirthChart;
use crate::error::SynastryError;
use crate::houses::{EqualHouse, HouseSystem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request naming a group and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequest {
    pub group_id: String,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub group_id: String,
    pub participants: Vec<String>,
    pub composite: CompositeChart,
    /// One entry per unordered pair (i < j) in participant order
    pub synastry_matrix: Vec<SynastryPair>,
    pub group_dynamics: Vec<GroupDynamic>,
    pub generated_at: DateTime<Utc>,
}

pub struct GroupSynastryEngine {
    house_system: Arc<dyn HouseSystem>,
    natal: AspectDetector,
    cross: AspectDetector,
}

impl Default for GroupSynastryEngine {
    fn default() -> Self {
        Self::new(Arc::new(EqualHouse))
    }
}

impl GroupSynastryEngine {
    pub fn new(house_system: Arc<dyn HouseSystem>) -> Self {
        Self {
            house_system,
            natal: AspectDetector::natal(),
            cross: AspectDetector::major(),
        }
    }

    /// Analyzes `charts` in the given order. Needs at least two; `cancel` is checked between pairs.
    pub fn analyze<C: AsRef<BirthChart>>(
        &self,
        group_id: &str,
        charts: &[C],
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<GroupAnalysis, SynastryError> {
        if charts.len() < 2 {
            return Err(SynastryError::InsufficientCharts {
                count: charts.len(),
            });
        }

        let composite = composite_chart(charts, self.house_system.as_ref(), &self.natal)?;

        let mut synastry_matrix = Vec::with_capacity(charts.len() * (charts.len() - 1) / 2);
        for i in 0..charts.len() {
            for j in (i + 1)..charts.len() {
                if cancel.is_cancelled() {
                    return Err(SynastryError::Cancelled);
                }
                synastry_matrix.push(synastry_pair(
                    charts[i].as_ref(),
                    charts[j].as_ref(),
                    &self.cross,
                ));
            }
        }

        let group_dynamics = group_dynamics(&synastry_matrix);
        log::debug!(
            "group {}: {} members, {} pairs, {} dynamics",
            group_id,
            charts.len(),
            synastry_matrix.len(),
            group_dynamics.len()
        );

        Ok(GroupAnalysis {
            group_id: group_id.to_string(),
            participants: charts.iter().map(|c| c.as_ref().owner_id.clone()).collect(),
            composite,
            synastry_matrix,
            group_dynamics,
            generated_at: now,
        })
    }
}
