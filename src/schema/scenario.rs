use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::case::CaseProfile;
use super::scene::{NextRef, Scene, SceneId};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("start scene \"{0}\" is not in the graph")]
    MissingStart(SceneId),
    #[error("scene \"{scene}\" option {option} targets unknown scene \"{target}\"")]
    DanglingTarget {
        scene: SceneId,
        option: usize,
        target: SceneId,
    },
    #[error("terminal scene \"{0}\" still offers options")]
    TerminalWithOptions(SceneId),
    #[error("scene \"{scene}\" uses a directive whose target \"{target}\" is not in the graph")]
    MissingDirectiveTarget { scene: SceneId, target: SceneId },
}

/// A scenario payload: the branching graph plus its case pool. The engine
/// treats a loaded set as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// The designated opening scene of every playthrough.
    pub start: SceneId,
    /// Profiles for the case-assignment directive. Empty means the
    /// built-in pool is used instead.
    #[serde(default)]
    pub case_profiles: Vec<CaseProfile>,
    pub scenes: HashMap<SceneId, Scene>,
}

impl ScenarioSet {
    pub fn load_from_ron(path: &Path) -> Result<ScenarioSet, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ScenarioSet, ScenarioError> {
        Ok(ron::from_str(input)?)
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Structural validation: the start scene exists, every literal target
    /// exists, terminal scenes offer no options, and every directive used
    /// in the graph can land on a defined scene.
    ///
    /// Opt-in — the engine itself tolerates an unvalidated graph and
    /// treats unresolvable targets as runtime no-ops.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.contains(&self.start) {
            return Err(ScenarioError::MissingStart(self.start.clone()));
        }
        for (id, scene) in &self.scenes {
            if scene.is_terminal() && !scene.options.is_empty() {
                return Err(ScenarioError::TerminalWithOptions(id.clone()));
            }
            for (index, option) in scene.options.iter().enumerate() {
                match &option.next {
                    NextRef::Scene(target) => {
                        if !self.contains(target) {
                            return Err(ScenarioError::DanglingTarget {
                                scene: id.clone(),
                                option: index,
                                target: target.clone(),
                            });
                        }
                    }
                    NextRef::Directive(directive) => {
                        for target in directive.designated_targets() {
                            if !self.contains(&target) {
                                return Err(ScenarioError::MissingDirectiveTarget {
                                    scene: id.clone(),
                                    target,
                                });
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
