use serde::{Deserialize, Serialize};

/// Newtype wrapper for scene ids — the keys of the scenario graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer deltas applied to the risk accumulators when a scene is
/// entered for the first time in a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub flight: i32,
    pub harm: i32,
}

/// Terminal payload. A scene carrying one ends the playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub message: String,
    pub moral: String,
}

/// Argument strategies recognized by the release-decision resolver.
/// Any *absent* argument scores a zero adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BailArgument {
    /// Release on the defendant's own recognizance.
    #[serde(rename = "OR")]
    Recognizance,
    /// Supervised release under court-set conditions.
    Conditions,
    /// Cash bond.
    Bond,
}

/// Well-known scene ids the computing directives resolve into. A graph
/// that uses those directives must define these scenes;
/// `ScenarioSet::validate` enforces it.
pub mod targets {
    pub const CASE_ASSIGNED: &str = "caseAssigned";
    pub const ROR_RELEASE: &str = "rorRelease";
    pub const STRICT_CONDITIONS: &str = "strictConditions";
    pub const HIGH_BOND: &str = "highBond";
    pub const ACQUITTAL: &str = "acquittal";
    pub const GUILTY_VERDICT: &str = "guiltyVerdict";
    pub const PROSECUTION_GUILTY: &str = "prosecutionGuilty";
    pub const PROSECUTION_ACQUITTAL: &str = "prosecutionAcquittal";
}

/// The closed set of symbolic transitions the engine recognizes.
///
/// A directive in an option's `next` slot triggers a resolver instead of
/// a direct graph lookup. Adding a variant here without a matching arm in
/// `core::resolver::resolve` is a compile error, not a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Draw a case profile from the pool and seed the risk accumulators
    /// with its base factors.
    AssignCase,
    /// Score accumulated flight risk and community harm into one of three
    /// release tiers.
    BailDecision,
    /// Compare professionalism against the verdict threshold, arguing for
    /// the defense.
    DefenseVerdict,
    /// Compare professionalism against the verdict threshold, arguing for
    /// the prosecution.
    ProsecutionVerdict,
    /// Set the named flag and continue to `then`.
    SetFlag { flag: String, then: SceneId },
}

impl Directive {
    /// Every scene id this directive can resolve to.
    pub fn designated_targets(&self) -> Vec<SceneId> {
        match self {
            Directive::AssignCase => vec![SceneId::from(targets::CASE_ASSIGNED)],
            Directive::BailDecision => vec![
                SceneId::from(targets::ROR_RELEASE),
                SceneId::from(targets::STRICT_CONDITIONS),
                SceneId::from(targets::HIGH_BOND),
            ],
            Directive::DefenseVerdict => vec![
                SceneId::from(targets::ACQUITTAL),
                SceneId::from(targets::GUILTY_VERDICT),
            ],
            Directive::ProsecutionVerdict => vec![
                SceneId::from(targets::PROSECUTION_GUILTY),
                SceneId::from(targets::PROSECUTION_ACQUITTAL),
            ],
            Directive::SetFlag { then, .. } => vec![then.clone()],
        }
    }
}

/// An option's transition: either a literal scene id or a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextRef {
    Scene(SceneId),
    Directive(Directive),
}

/// A candidate player choice attached to a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub next: NextRef,
    /// The option is offered only while this flag is set.
    #[serde(default)]
    pub condition: Option<String>,
    /// Added to the professionalism accumulator when chosen.
    #[serde(default)]
    pub points: Option<i32>,
    /// Consumed by the release-decision resolver.
    #[serde(default)]
    pub argument: Option<BailArgument>,
}

/// A node in the narrative graph: the unit of displayed content and
/// branching. Option order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub text: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub risk_factors: Option<RiskFactors>,
    #[serde(default)]
    pub ending: Option<Ending>,
}

impl Scene {
    /// Terminal scenes end the playthrough until a restart.
    pub fn is_terminal(&self) -> bool {
        self.ending.is_some()
    }
}
