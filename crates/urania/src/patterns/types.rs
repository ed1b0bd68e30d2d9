use crate::western::Body;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    GrandTrine,
    TSquare,
    GrandCross,
    Yod,
    Stellium,
}

impl PatternKind {
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::GrandTrine => "grand_trine",
            PatternKind::TSquare => "t_square",
            PatternKind::GrandCross => "grand_cross",
            PatternKind::Yod => "yod",
            PatternKind::Stellium => "stellium",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A multi-body configuration found in an aspect set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPattern {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// Participating bodies in body order
    pub members: Vec<Body>,
    /// Focal body of a T-square or yod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apex: Option<Body>,
    pub strength: f64,
}

impl ChartPattern {
    pub fn contains(&self, body: Body) -> bool {
        self.members.contains(&body)
    }
}
