/// Per-playthrough game state — accumulators, flags, visited set, and the
/// in-memory transcript.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::schema::case::CaseProfile;
use crate::schema::scene::{RiskFactors, SceneId};

/// One line of the "story so far" list kept for the current playthrough.
/// Distinct from the externally recorded history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub scene_text: String,
    pub choice_text: String,
}

/// The complete mutable state of one playthrough. Created by `start()`,
/// mutated in place by each `choose()`, replaced wholesale by
/// `restart()`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub current: SceneId,
    /// Scene ids entered this playthrough. Gates one-time risk deltas.
    pub visited: FxHashSet<SceneId>,
    pub flight_risk: i32,
    pub community_harm: i32,
    pub professionalism: i32,
    pub flags: FxHashMap<String, bool>,
    pub active_case: Option<CaseProfile>,
    pub transcript: Vec<TranscriptEntry>,
}

impl GameState {
    /// Zeroed state positioned at `start`. The start scene counts as
    /// entered, but its risk deltas are not applied.
    pub fn new(start: SceneId) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(start.clone());
        Self {
            current: start,
            visited,
            flight_risk: 0,
            community_harm: 0,
            professionalism: 0,
            flags: FxHashMap::default(),
            active_case: None,
            transcript: Vec::new(),
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, name: &str) {
        self.flags.insert(name.to_string(), true);
    }

    /// Marks `id` entered; true only on the first entry this playthrough.
    pub fn mark_visited(&mut self, id: &SceneId) -> bool {
        self.visited.insert(id.clone())
    }

    pub fn apply_risk(&mut self, risk: RiskFactors) {
        self.flight_risk += risk.flight;
        self.community_harm += risk.harm;
    }

    /// Case assignment overwrites the risk accumulators with the
    /// profile's base factors rather than adding to them.
    pub fn assign_case(&mut self, profile: CaseProfile) {
        self.flight_risk = profile.risk.flight;
        self.community_harm = profile.risk.harm;
        self.active_case = Some(profile);
    }

    pub fn record_choice(&mut self, scene_text: &str, choice_text: &str) {
        self.transcript.push(TranscriptEntry {
            scene_text: scene_text.to_string(),
            choice_text: choice_text.to_string(),
        });
    }
}
