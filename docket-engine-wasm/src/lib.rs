//! WASM bindings for docket-engine — powers the interactive web
//! frontend. Scene views and transcripts cross the boundary as JSON.

use wasm_bindgen::prelude::*;

use docket_engine::core::engine::{Engine, EngineStatus, SceneView};
use docket_engine::schema::scenario::ScenarioSet;

// ---------------------------------------------------------------------------
// Embedded scenario data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const COURTROOM: &str = include_str!("../../scenario_data/courtroom.ron");
    pub const DISBARMENT: &str = include_str!("../../scenario_data/disbarment.ron");
}

fn view_json(view: &SceneView) -> Result<String, JsError> {
    serde_json::to_string(view).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// DocketGame — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct DocketGame {
    engine: Engine,
    scenario: String,
}

#[wasm_bindgen]
impl DocketGame {
    /// Create a new game for the given scenario name and seed.
    #[wasm_bindgen(constructor)]
    pub fn new(scenario: &str, seed: u64) -> Result<DocketGame, JsError> {
        let payload = match scenario {
            "courtroom" => data::COURTROOM,
            "disbarment" => data::DISBARMENT,
            _ => return Err(JsError::new(&format!("Unknown scenario: {scenario}"))),
        };

        let set = ScenarioSet::parse_ron(payload)
            .map_err(|e| JsError::new(&format!("Scenario parse error: {e}")))?;
        let engine = Engine::builder().with_scenarios(set).seed(seed).build();

        Ok(DocketGame {
            engine,
            scenario: scenario.to_string(),
        })
    }

    /// Begin (or re-begin) a playthrough. Returns the opening scene view
    /// as JSON.
    pub fn start(&mut self) -> Result<String, JsError> {
        let view = self
            .engine
            .start()
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        view_json(&view)
    }

    /// Advance by the option index carried in the view's `options`
    /// entries. Stale input returns the unchanged current view.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        let view = self
            .engine
            .choose(index)
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        view_json(&view)
    }

    /// Discard the playthrough and start over.
    pub fn restart(&mut self) -> Result<String, JsError> {
        let view = self
            .engine
            .restart()
            .map_err(|e| JsError::new(&format!("Engine error: {e}")))?;
        view_json(&view)
    }

    /// Current lifecycle state: "idle", "playing" or "terminal".
    pub fn status(&self) -> String {
        match self.engine.status() {
            EngineStatus::Idle => "idle",
            EngineStatus::Playing => "playing",
            EngineStatus::Terminal => "terminal",
        }
        .to_string()
    }

    /// The "story so far" list for the current playthrough, as a JSON
    /// array of `{scene_text, choice_text}` objects.
    pub fn transcript(&self) -> Result<String, JsError> {
        serde_json::to_string(self.engine.transcript())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// The (possibly locally generated) player id history entries are
    /// attributed to.
    pub fn user_id(&self) -> String {
        self.engine.user_id().to_string()
    }

    /// The scenario this game was built from.
    pub fn scenario_name(&self) -> String {
        self.scenario.clone()
    }

    /// Return a JSON array of available scenario identifiers.
    pub fn available_scenarios() -> String {
        serde_json::to_string(&["courtroom", "disbarment"]).unwrap_or_else(|_| "[]".to_string())
    }

    /// Rebuild the engine with a new seed (same scenario).
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        let fresh = DocketGame::new(&self.scenario.clone(), seed)?;
        self.engine = fresh.engine;
        Ok(())
    }
}
