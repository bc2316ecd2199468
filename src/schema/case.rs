use rand::Rng;
use serde::{Deserialize, Serialize};

use super::scene::RiskFactors;

/// A parameterization record for randomized case scenes: who the
/// defendant is, what they are accused of, and the base risk the court
/// starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseProfile {
    #[serde(default)]
    pub defendant: String,
    #[serde(default)]
    pub charge: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub victim: String,
    #[serde(default)]
    pub incident: String,
    pub risk: RiskFactors,
}

/// The fixed set of case profiles a scenario draws from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasePool {
    pub profiles: Vec<CaseProfile>,
}

impl CasePool {
    pub fn new(profiles: Vec<CaseProfile>) -> Self {
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Uniform draw through a caller-supplied random source.
    pub fn pick(&self, rng: &mut impl Rng) -> Option<&CaseProfile> {
        if self.profiles.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.profiles.len());
        self.profiles.get(index)
    }

    /// The pool shipped with the crate, used when a scenario payload
    /// carries no profiles of its own.
    pub fn builtin() -> Self {
        fn profile(
            defendant: &str,
            charge: &str,
            history: &str,
            victim: &str,
            incident: &str,
            flight: i32,
            harm: i32,
        ) -> CaseProfile {
            CaseProfile {
                defendant: defendant.to_string(),
                charge: charge.to_string(),
                history: history.to_string(),
                victim: victim.to_string(),
                incident: incident.to_string(),
                risk: RiskFactors { flight, harm },
            }
        }

        Self::new(vec![
            profile(
                "Marcus Webb",
                "second-degree burglary",
                "Two prior property convictions, both more than five years old.",
                "The Hendersons, whose garage was entered overnight.",
                "A neighbor reported a figure leaving the garage with a toolbox at 2 a.m.",
                3,
                2,
            ),
            profile(
                "Dana Okafor",
                "felony check fraud",
                "No prior record.",
                "A regional credit union out roughly nine thousand dollars.",
                "Twelve checks drawn on a closed account over three weeks.",
                1,
                1,
            ),
            profile(
                "Raymond Soto",
                "aggravated assault",
                "One prior misdemeanor battery; probation completed.",
                "A bartender who needed eight stitches.",
                "A dispute over a tab ended with a thrown glass.",
                4,
                6,
            ),
            profile(
                "Felicia Grant",
                "possession with intent to distribute",
                "Two failures to appear in the last eighteen months.",
                "None named in the complaint.",
                "A traffic stop turned up a duffel bag of pills.",
                7,
                3,
            ),
            profile(
                "Victor Hale",
                "armed robbery",
                "Released on parole four months ago.",
                "A convenience store clerk held at knifepoint.",
                "The register was emptied just before closing; the knife was recovered nearby.",
                8,
                7,
            ),
        ])
    }
}
