/// The narrative engine — owns one playthrough's state and drives
/// scene-to-scene transitions.
///
/// Built via `Engine::builder()`. The caller loop is `start()`, then
/// `choose()` until a terminal scene, then `restart()`.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::options::visible_options;
use crate::core::render::{render, Paragraph};
use crate::core::resolver::{self, Effect, Resolution, ResolverInput};
use crate::core::state::{GameState, TranscriptEntry};
use crate::recorder::{HistoryRecorder, NullRecorder, PlayerIdentity};
use crate::schema::case::CasePool;
use crate::schema::history::HistoryEntry;
use crate::schema::scenario::ScenarioSet;
use crate::schema::scene::{Ending, NextRef, RiskFactors, SceneId};

#[derive(Debug, Error)]
pub enum EngineError {
    /// No usable scenario payload; the engine has not left `Idle`.
    #[error("scenario payload is not loaded")]
    NotReady,
}

/// Engine lifecycle states. `Idle` before the first successful
/// `start()`, `Terminal` once the current scene carries an ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineStatus {
    Idle,
    Playing,
    Terminal,
}

/// Accumulator snapshot shipped with every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    pub flight_risk: i32,
    pub community_harm: i32,
    pub professionalism: i32,
}

/// One option as offered to the player. `index` is the option's position
/// in the scene's full option list and is what `choose()` expects back,
/// so a selection stays valid even when gating hides earlier options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub index: usize,
    pub text: String,
}

/// Everything the presentation layer needs to draw the current scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneView {
    pub scene_id: SceneId,
    pub paragraphs: Vec<Paragraph>,
    pub options: Vec<OptionView>,
    /// Risk deltas applied by the transition that produced this view;
    /// `None` when the scene was already visited or carries none, which
    /// tells the caller to suppress the risk display.
    pub risk: Option<RiskFactors>,
    pub ending: Option<Ending>,
    pub score: Scorecard,
}

/// The top-level simulation engine. One instance owns one playthrough at
/// a time; independent playthroughs are independent instances.
pub struct Engine {
    scenarios: Option<ScenarioSet>,
    pool: CasePool,
    rng: StdRng,
    recorder: Box<dyn HistoryRecorder>,
    identity: PlayerIdentity,
    app_id: String,
    state: Option<GameState>,
}

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder {
    scenario_path: Option<PathBuf>,
    scenarios: Option<ScenarioSet>,
    pool: Option<CasePool>,
    seed: u64,
    recorder: Option<Box<dyn HistoryRecorder>>,
    identity: Option<PlayerIdentity>,
    app_id: String,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            scenario_path: None,
            scenarios: None,
            pool: None,
            seed: 0,
            recorder: None,
            identity: None,
            app_id: "docket-engine".to_string(),
        }
    }

    pub fn status(&self) -> EngineStatus {
        match &self.state {
            None => EngineStatus::Idle,
            Some(state) => match self.scene_of(&state.current) {
                Some(scene) if scene.is_terminal() => EngineStatus::Terminal,
                _ => EngineStatus::Playing,
            },
        }
    }

    pub fn user_id(&self) -> &str {
        self.identity.user_id()
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// The "story so far" list for the current playthrough.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.state
            .as_ref()
            .map(|state| state.transcript.as_slice())
            .unwrap_or(&[])
    }

    fn scene_of(&self, id: &SceneId) -> Option<&crate::schema::scene::Scene> {
        self.scenarios.as_ref().and_then(|set| set.get(id))
    }

    /// Begins a fresh playthrough. Idempotent: calling mid-playthrough
    /// re-initializes. Previously recorded history is consulted only for
    /// information; the opening scene is always the graph's designated
    /// start.
    pub fn start(&mut self) -> Result<SceneView, EngineError> {
        let scenarios = self.scenarios.as_ref().ok_or(EngineError::NotReady)?;
        let start = scenarios.start.clone();
        if !scenarios.contains(&start) {
            tracing::warn!(scene = %start, "start scene missing from graph");
            return Err(EngineError::NotReady);
        }

        let prior = self.recorder.load(self.identity.user_id());
        if !prior.is_empty() {
            tracing::debug!(entries = prior.len(), "prior history found; starting fresh anyway");
        }

        self.state = Some(GameState::new(start));
        self.view_with_risk(None)
    }

    /// Discards the playthrough and behaves like a fresh `start()`.
    pub fn restart(&mut self) -> Result<SceneView, EngineError> {
        self.start()
    }

    /// Re-renders the current scene without advancing.
    pub fn view(&self) -> Result<SceneView, EngineError> {
        self.view_with_risk(None)
    }

    /// Advances the playthrough by the option at `index` in the current
    /// scene's option list.
    ///
    /// Stale input — an index out of range, an option hidden by its
    /// condition, a finished playthrough, a target missing from the
    /// graph — re-returns the current view with nothing changed.
    pub fn choose(&mut self, index: usize) -> Result<SceneView, EngineError> {
        let state = self.state.as_ref().ok_or(EngineError::NotReady)?;
        let scenarios = self.scenarios.as_ref().ok_or(EngineError::NotReady)?;
        let current_id = state.current.clone();
        let scene = scenarios.get(&current_id).ok_or(EngineError::NotReady)?;

        if scene.is_terminal() {
            tracing::debug!(scene = %current_id, "choose() after the ending is a no-op");
            return self.view_with_risk(None);
        }

        let offered = visible_options(&scene.options, &state.flags);
        let Some(option) = offered
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, option)| (*option).clone())
        else {
            tracing::debug!(scene = %current_id, index, "stale or hidden option; ignoring");
            return self.view_with_risk(None);
        };
        let scene_text = scene.text.clone();

        // Resolve against a points-adjusted probe, so verdicts count this
        // choice and an unresolvable target leaves every accumulator
        // untouched.
        let input = ResolverInput {
            flight_risk: state.flight_risk,
            community_harm: state.community_harm,
            professionalism: state.professionalism + option.points.unwrap_or(0),
            argument: option.argument,
        };
        let resolution = match &option.next {
            NextRef::Scene(id) => Resolution {
                target: id.clone(),
                effect: None,
            },
            NextRef::Directive(directive) => {
                resolver::resolve(directive, &input, &self.pool, &mut self.rng)
            }
        };

        // Fail-safe: an id the graph does not know is a no-op, not a
        // crash.
        if !scenarios.contains(&resolution.target) {
            tracing::warn!(scene = %current_id, target = %resolution.target,
                "resolved target missing from graph; ignoring choice");
            return self.view_with_risk(None);
        }
        let target_id = resolution.target.clone();
        let target_risk = scenarios
            .get(&target_id)
            .and_then(|scene| scene.risk_factors);
        let is_terminal = scenarios
            .get(&target_id)
            .map(|scene| scene.is_terminal())
            .unwrap_or(false);

        // Commit.
        let state = self.state.as_mut().ok_or(EngineError::NotReady)?;
        state.record_choice(&scene_text, &option.text);
        if let Some(points) = option.points {
            state.professionalism += points;
        }
        match resolution.effect {
            Some(Effect::AssignCase(profile)) => state.assign_case(profile),
            Some(Effect::SetFlag(flag)) => state.set_flag(&flag),
            None => {}
        }
        let mut applied_risk = None;
        if state.mark_visited(&target_id) {
            if let Some(risk) = target_risk {
                state.apply_risk(risk);
                applied_risk = Some(risk);
            }
        }
        state.current = target_id.clone();
        tracing::debug!(from = %current_id, to = %target_id, terminal = is_terminal,
            "scene transition");

        // Fire-and-forget: the recorder owns delivery; its failures never
        // reach the player.
        self.recorder.append(HistoryEntry {
            scene_text,
            choice_text: option.text.clone(),
            user_id: self.identity.user_id().to_string(),
            app_id: self.app_id.clone(),
            timestamp: Utc::now(),
        });

        self.view_with_risk(applied_risk)
    }

    fn view_with_risk(&self, risk: Option<RiskFactors>) -> Result<SceneView, EngineError> {
        let state = self.state.as_ref().ok_or(EngineError::NotReady)?;
        let scene = self.scene_of(&state.current).ok_or(EngineError::NotReady)?;
        let options = visible_options(&scene.options, &state.flags)
            .into_iter()
            .map(|(index, option)| OptionView {
                index,
                text: option.text.clone(),
            })
            .collect();

        Ok(SceneView {
            scene_id: state.current.clone(),
            paragraphs: render(&scene.text, state.active_case.as_ref()),
            options,
            risk,
            ending: scene.ending.clone(),
            score: Scorecard {
                flight_risk: state.flight_risk,
                community_harm: state.community_harm,
                professionalism: state.professionalism,
            },
        })
    }
}

impl EngineBuilder {
    /// Scenario payload to load at build time. A missing or malformed
    /// file is logged and leaves the engine permanently `Idle` — a
    /// degraded mode, not a failure.
    pub fn scenario_path(mut self, path: impl AsRef<Path>) -> Self {
        self.scenario_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide a scenario set directly (for testing without files).
    pub fn with_scenarios(mut self, scenarios: ScenarioSet) -> Self {
        self.scenarios = Some(scenarios);
        self
    }

    /// Provide a case pool directly, overriding the payload's profiles.
    pub fn with_case_pool(mut self, pool: CasePool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Seed for the engine's random source. Same seed, same draws.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn recorder(mut self, recorder: Box<dyn HistoryRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn identity(mut self, identity: PlayerIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn app_id(mut self, app_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self
    }

    pub fn build(self) -> Engine {
        let mut scenarios = self.scenarios;
        if let Some(ref path) = self.scenario_path {
            match ScenarioSet::load_from_ron(path) {
                Ok(set) => scenarios = Some(set),
                Err(err) => {
                    tracing::error!(error = %err, path = %path.display(),
                        "scenario payload unusable; engine will stay idle");
                }
            }
        }

        let pool = match self.pool {
            Some(pool) => pool,
            None => match &scenarios {
                Some(set) if !set.case_profiles.is_empty() => {
                    CasePool::new(set.case_profiles.clone())
                }
                _ => CasePool::builtin(),
            },
        };

        Engine {
            scenarios,
            pool,
            rng: StdRng::seed_from_u64(self.seed),
            recorder: self.recorder.unwrap_or_else(|| Box::new(NullRecorder)),
            identity: self.identity.unwrap_or_else(PlayerIdentity::anonymous),
            app_id: self.app_id,
            state: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MemoryRecorder;
    use crate::schema::case::CaseProfile;
    use crate::schema::scenario::ScenarioSet;

    // A small synthetic graph exercising literals, risk deltas, a cycle,
    // a dangling target, a conditioned option, and a terminal scene.
    fn make_scenarios() -> ScenarioSet {
        ScenarioSet::parse_ron(
            r#"(
                start: "lobby",
                scenes: {
                    "lobby": (
                        text: "You are in the lobby.",
                        options: [
                            ( text: "Enter the records room.", next: Scene("records") ),
                            ( text: "Take the broken door.", next: Scene("missing") ),
                            ( text: "File the motion.", next: Directive(SetFlag(flag: "limineSuccess", then: "lobbyAnnex")) ),
                            ( text: "Cite the ruling.", next: Scene("records"), condition: Some("limineSuccess"), points: Some(2) ),
                            ( text: "Do paperwork.", next: Scene("lobbyAnnex"), points: Some(3) ),
                            ( text: "Go home.", next: Scene("end") ),
                        ],
                    ),
                    "records": (
                        text: "Dusty shelves.",
                        risk_factors: Some(( flight: 2, harm: 3 )),
                        options: [
                            ( text: "Back to the lobby.", next: Scene("lobby") ),
                        ],
                    ),
                    "lobbyAnnex": (
                        text: "A quieter corner of the lobby.",
                        options: [
                            ( text: "Back to the lobby.", next: Scene("lobby") ),
                        ],
                    ),
                    "end": (
                        text: "The building closes.",
                        ending: Some(( message: "Day over.", moral: "Go home earlier." )),
                    ),
                },
            )"#,
        )
        .unwrap()
    }

    fn make_engine() -> Engine {
        Engine::builder()
            .with_scenarios(make_scenarios())
            .seed(7)
            .build()
    }

    #[test]
    fn builder_without_scenarios_stays_idle() {
        let mut engine = Engine::builder().build();
        assert_eq!(engine.status(), EngineStatus::Idle);
        assert!(matches!(engine.start(), Err(EngineError::NotReady)));
        assert!(matches!(engine.choose(0), Err(EngineError::NotReady)));
    }

    #[test]
    fn unreadable_scenario_file_stays_idle() {
        let mut engine = Engine::builder()
            .scenario_path("no/such/payload.ron")
            .build();
        assert_eq!(engine.status(), EngineStatus::Idle);
        assert!(matches!(engine.start(), Err(EngineError::NotReady)));
    }

    #[test]
    fn start_offers_only_visible_options() {
        let mut engine = make_engine();
        let view = engine.start().unwrap();
        assert_eq!(engine.status(), EngineStatus::Playing);
        assert_eq!(view.scene_id.as_str(), "lobby");
        // Option 3 is gated on an unset flag.
        let indices: Vec<usize> = view.options.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn risk_is_applied_once_per_playthrough() {
        let mut engine = make_engine();
        engine.start().unwrap();

        let view = engine.choose(0).unwrap(); // lobby -> records, first entry
        assert_eq!(view.risk, Some(RiskFactors { flight: 2, harm: 3 }));
        assert_eq!(view.score.flight_risk, 2);
        assert_eq!(view.score.community_harm, 3);

        engine.choose(0).unwrap(); // records -> lobby
        let view = engine.choose(0).unwrap(); // lobby -> records, re-entry
        assert_eq!(view.risk, None, "re-entry must suppress the risk display");
        assert_eq!(view.score.flight_risk, 2);
        assert_eq!(view.score.community_harm, 3);
    }

    #[test]
    fn unresolved_target_is_a_complete_no_op() {
        let mut engine = make_engine();
        engine.start().unwrap();
        let before = engine.state().unwrap().clone();

        let view = engine.choose(1).unwrap(); // "missing" is not in the graph
        assert_eq!(view.scene_id.as_str(), "lobby");
        assert_eq!(engine.state().unwrap(), &before);
    }

    #[test]
    fn stale_or_hidden_option_is_a_no_op() {
        let mut engine = make_engine();
        engine.start().unwrap();
        let before = engine.state().unwrap().clone();

        let view = engine.choose(99).unwrap();
        assert_eq!(view.scene_id.as_str(), "lobby");
        assert_eq!(engine.state().unwrap(), &before);

        // Index 3 exists but is hidden until its flag is set.
        let view = engine.choose(3).unwrap();
        assert_eq!(view.scene_id.as_str(), "lobby");
        assert_eq!(engine.state().unwrap(), &before);
    }

    #[test]
    fn flag_round_trip_reveals_gated_option() {
        let mut engine = make_engine();
        engine.start().unwrap();

        let view = engine.choose(2).unwrap(); // SetFlag directive
        assert_eq!(view.scene_id.as_str(), "lobbyAnnex");
        assert!(engine.state().unwrap().flag("limineSuccess"));

        let view = engine.choose(0).unwrap(); // back to the lobby
        let indices: Vec<usize> = view.options.iter().map(|o| o.index).collect();
        assert!(indices.contains(&3), "gated option should now be offered");
    }

    #[test]
    fn points_accumulate_only_from_chosen_options() {
        let mut engine = make_engine();
        engine.start().unwrap();
        let view = engine.choose(4).unwrap(); // +3 professionalism
        assert_eq!(view.score.professionalism, 3);
        assert_eq!(view.score.flight_risk, 0);
    }

    #[test]
    fn terminal_scene_halts_until_restart() {
        let mut engine = make_engine();
        engine.start().unwrap();
        let view = engine.choose(5).unwrap();
        assert_eq!(engine.status(), EngineStatus::Terminal);
        assert!(view.ending.is_some());
        assert!(view.options.is_empty());

        let after = engine.choose(0).unwrap();
        assert_eq!(after.scene_id.as_str(), "end");
        assert_eq!(engine.status(), EngineStatus::Terminal);

        engine.restart().unwrap();
        assert_eq!(engine.status(), EngineStatus::Playing);
    }

    #[test]
    fn restart_resets_everything() {
        let mut engine = make_engine();
        engine.start().unwrap();
        engine.choose(0).unwrap(); // pick up risk
        engine.choose(0).unwrap();
        engine.choose(2).unwrap(); // set a flag
        engine.choose(0).unwrap();
        engine.choose(4).unwrap(); // gain points

        engine.restart().unwrap();
        assert_eq!(
            engine.state().unwrap(),
            &GameState::new(SceneId::from("lobby"))
        );
    }

    #[test]
    fn start_mid_playthrough_reinitializes() {
        let mut engine = make_engine();
        engine.start().unwrap();
        engine.choose(4).unwrap();
        let view = engine.start().unwrap();
        assert_eq!(view.scene_id.as_str(), "lobby");
        assert_eq!(view.score.professionalism, 0);
    }

    #[test]
    fn choices_are_recorded_with_identity() {
        let recorder = MemoryRecorder::new();
        let mut engine = Engine::builder()
            .with_scenarios(make_scenarios())
            .recorder(Box::new(recorder.clone()))
            .identity(PlayerIdentity::from_user_id("tester"))
            .app_id("docket-test")
            .build();

        engine.start().unwrap();
        engine.choose(0).unwrap();
        engine.choose(0).unwrap();

        let entries = recorder.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, "tester");
        assert_eq!(entries[0].app_id, "docket-test");
        assert_eq!(entries[0].choice_text, "Enter the records room.");
        assert_eq!(entries[0].scene_text, "You are in the lobby.");
    }

    #[test]
    fn no_op_choices_are_not_recorded() {
        let recorder = MemoryRecorder::new();
        let mut engine = Engine::builder()
            .with_scenarios(make_scenarios())
            .recorder(Box::new(recorder.clone()))
            .build();

        engine.start().unwrap();
        engine.choose(1).unwrap(); // unresolved target
        engine.choose(99).unwrap(); // stale index
        assert!(recorder.is_empty());
        assert!(engine.transcript().is_empty());
    }

    #[test]
    fn case_assignment_overwrites_prior_risk() {
        let profile = CaseProfile {
            defendant: "Test Defendant".to_string(),
            charge: "test charge".to_string(),
            history: "none".to_string(),
            victim: "none".to_string(),
            incident: "none".to_string(),
            risk: RiskFactors { flight: 4, harm: 1 },
        };
        let scenarios = ScenarioSet::parse_ron(
            r#"(
                start: "lobby",
                scenes: {
                    "lobby": (
                        text: "Lobby.",
                        options: [
                            ( text: "Risky detour.", next: Scene("records") ),
                            ( text: "Take a case.", next: Directive(AssignCase) ),
                        ],
                    ),
                    "records": (
                        text: "Records.",
                        risk_factors: Some(( flight: 9, harm: 9 )),
                        options: [ ( text: "Back.", next: Scene("lobby") ) ],
                    ),
                    "caseAssigned": (
                        text: "Your client is {defendant}, charged with {charge}.",
                        options: [],
                    ),
                },
            )"#,
        )
        .unwrap();

        let mut engine = Engine::builder()
            .with_scenarios(scenarios)
            .with_case_pool(CasePool::new(vec![profile.clone()]))
            .build();

        engine.start().unwrap();
        engine.choose(0).unwrap(); // accumulate (9, 9)
        engine.choose(0).unwrap();
        let view = engine.choose(1).unwrap(); // assignment overwrites

        assert_eq!(view.score.flight_risk, 4);
        assert_eq!(view.score.community_harm, 1);
        assert_eq!(
            engine.state().unwrap().active_case.as_ref().unwrap(),
            &profile
        );
        // Rendering picked up the profile.
        let text: String = view.paragraphs[0]
            .spans
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(
            text,
            "Your client is Test Defendant, charged with test charge."
        );
    }
}
