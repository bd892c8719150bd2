//! Placement candidates and the complete per-analysis result.
//!
//! A [`PlacementResult`] always holds exactly one candidate per grid
//! position. It serializes as a JSON object keyed by position name:
//!
//! ```json
//! {
//!   "top_left": {"score": 0.82, "quality": "excellent", "recommended_font_size": 48},
//!   "...": "...",
//!   "bottom_right": {"score": 0.41, "quality": "fair", "recommended_font_size": 36}
//! }
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::OverlayError;
use crate::grid::Position;
use crate::style::{MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Minimum score for [`Quality::Excellent`].
pub const EXCELLENT_THRESHOLD: f64 = 0.8;
/// Minimum score for [`Quality::Good`].
pub const GOOD_THRESHOLD: f64 = 0.6;

/// Score bucket shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
}

impl Quality {
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if score >= GOOD_THRESHOLD {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored proposal for one grid position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    pub position: Position,
    pub score: f64,
    pub quality: Quality,
    pub recommended_font_size: u32,
}

impl PlacementCandidate {
    /// Build a candidate; the quality bucket is derived from the score.
    pub fn new(position: Position, score: f64, recommended_font_size: u32) -> Self {
        Self {
            position,
            score,
            quality: Quality::from_score(score),
            recommended_font_size,
        }
    }
}

/// Wire shape of one candidate (the position is the map key).
#[derive(Debug, Serialize, Deserialize)]
struct CandidateEntry {
    score: f64,
    quality: Quality,
    recommended_font_size: u32,
}

/// Total order used to break score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Position>", into = "Vec<Position>")]
pub struct PositionPriority([Position; 9]);

impl Default for PositionPriority {
    /// bottom_right > center > top_center > bottom_center > bottom_left >
    /// center_left > center_right > top_left > top_right
    fn default() -> Self {
        Self([
            Position::BottomRight,
            Position::Center,
            Position::TopCenter,
            Position::BottomCenter,
            Position::BottomLeft,
            Position::CenterLeft,
            Position::CenterRight,
            Position::TopLeft,
            Position::TopRight,
        ])
    }
}

impl PositionPriority {
    /// Build from an explicit order, which must name every position once.
    pub fn new(order: &[Position]) -> Result<Self, OverlayError> {
        if order.len() != Position::ALL.len() {
            return Err(OverlayError::config(format!(
                "position priority must list all 9 positions, got {}",
                order.len()
            )));
        }
        let mut seen = [false; 9];
        for p in order {
            if std::mem::replace(&mut seen[p.index()], true) {
                return Err(OverlayError::config(format!(
                    "position '{}' appears twice in priority order",
                    p
                )));
            }
        }
        let mut positions = [Position::TopLeft; 9];
        positions.copy_from_slice(order);
        Ok(Self(positions))
    }

    /// 0 for the most preferred position.
    pub fn rank(&self, position: Position) -> usize {
        self.0
            .iter()
            .position(|p| *p == position)
            .unwrap_or(Position::ALL.len())
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.0
    }
}

impl TryFrom<Vec<Position>> for PositionPriority {
    type Error = OverlayError;

    fn try_from(value: Vec<Position>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PositionPriority> for Vec<Position> {
    fn from(value: PositionPriority) -> Self {
        value.0.to_vec()
    }
}

/// Complete analysis output: one candidate per position, plus the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementResult {
    candidates: [PlacementCandidate; 9],
    ranking: [Position; 9],
}

impl PlacementResult {
    /// `candidates` must be indexed like [`Position::ALL`].
    pub fn new(candidates: [PlacementCandidate; 9], priority: &PositionPriority) -> Self {
        let mut ranking = Position::ALL;
        ranking.sort_by(|a, b| {
            let sa = candidates[a.index()].score;
            let sb = candidates[b.index()].score;
            sb.total_cmp(&sa)
                .then_with(|| priority.rank(*a).cmp(&priority.rank(*b)))
        });
        Self {
            candidates,
            ranking,
        }
    }

    pub fn get(&self, position: Position) -> &PlacementCandidate {
        &self.candidates[position.index()]
    }

    /// Always 9.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Candidates in row-major position order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacementCandidate> {
        self.candidates.iter()
    }

    /// Candidates from best to worst, ties broken by position priority.
    pub fn ranked(&self) -> impl Iterator<Item = &PlacementCandidate> {
        self.ranking.iter().map(move |p| self.get(*p))
    }

    pub fn best(&self) -> &PlacementCandidate {
        self.get(self.ranking[0])
    }

    /// Re-rank with a different tie-break order.
    pub fn with_priority(self, priority: &PositionPriority) -> Self {
        Self::new(self.candidates, priority)
    }
}

impl Serialize for PlacementResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.candidates.len()))?;
        for c in &self.candidates {
            map.serialize_entry(
                c.position.as_str(),
                &CandidateEntry {
                    score: c.score,
                    quality: c.quality,
                    recommended_font_size: c.recommended_font_size,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlacementResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<Position, CandidateEntry>::deserialize(deserializer)?;
        if entries.len() != Position::ALL.len() {
            return Err(D::Error::custom(format!(
                "placement result needs all 9 positions, got {}",
                entries.len()
            )));
        }

        let mut candidates = Position::ALL.map(|p| PlacementCandidate::new(p, 0.0, 0));
        for (position, entry) in entries {
            if !(0.0..=1.0).contains(&entry.score) {
                return Err(D::Error::custom(format!(
                    "score {} for {} outside [0, 1]",
                    entry.score, position
                )));
            }
            if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&entry.recommended_font_size) {
                return Err(D::Error::custom(format!(
                    "recommended_font_size {} for {} outside {}..={}",
                    entry.recommended_font_size, position, MIN_FONT_SIZE, MAX_FONT_SIZE
                )));
            }
            let candidate =
                PlacementCandidate::new(position, entry.score, entry.recommended_font_size);
            if candidate.quality != entry.quality {
                return Err(D::Error::custom(format!(
                    "quality '{}' for {} does not match score {} (expected '{}')",
                    entry.quality, position, entry.score, candidate.quality
                )));
            }
            candidates[position.index()] = candidate;
        }
        Ok(Self::new(candidates, &PositionPriority::default()))
    }
}
