/// Directive resolvers — pure mappings from accumulated state to a
/// target scene id.
///
/// Resolvers never touch `GameState`; the mutations a directive implies
/// ride back to the engine as an `Effect` and are applied there.

use rand::Rng;

use crate::schema::case::{CasePool, CaseProfile};
use crate::schema::scene::{targets, BailArgument, Directive, SceneId};

/// Professionalism at or above this threshold wins the player's side of
/// the case, whichever table they argue from.
pub const VERDICT_THRESHOLD: i32 = 5;

/// Snapshot of the accumulators a resolver may read. The engine builds
/// it after the chosen option's points are counted, so verdicts see the
/// final score.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput {
    pub flight_risk: i32,
    pub community_harm: i32,
    pub professionalism: i32,
    pub argument: Option<BailArgument>,
}

/// A resolved transition: where to go, plus any state mutation the
/// engine must apply on commit.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub target: SceneId,
    pub effect: Option<Effect>,
}

#[derive(Debug, Clone)]
pub enum Effect {
    /// Replace the active case; the risk accumulators are overwritten
    /// with the profile's base factors.
    AssignCase(CaseProfile),
    /// Set the named flag.
    SetFlag(String),
}

/// Maps a directive to its concrete target scene. Exhaustive over the
/// closed directive set.
pub fn resolve(
    directive: &Directive,
    input: &ResolverInput,
    pool: &CasePool,
    rng: &mut impl Rng,
) -> Resolution {
    match directive {
        Directive::AssignCase => {
            let effect = pool.pick(rng).cloned().map(Effect::AssignCase);
            if effect.is_none() {
                tracing::warn!("case pool is empty; assignment resolved without a profile");
            }
            Resolution {
                target: SceneId::from(targets::CASE_ASSIGNED),
                effect,
            }
        }
        Directive::BailDecision => {
            let score = bail_score(input.flight_risk, input.community_harm, input.argument);
            let target = if score <= 2 {
                targets::ROR_RELEASE
            } else if score <= 12 {
                targets::STRICT_CONDITIONS
            } else {
                targets::HIGH_BOND
            };
            tracing::debug!(score, target, "release decision scored");
            Resolution {
                target: SceneId::from(target),
                effect: None,
            }
        }
        Directive::DefenseVerdict => {
            let target = if input.professionalism >= VERDICT_THRESHOLD {
                targets::ACQUITTAL
            } else {
                targets::GUILTY_VERDICT
            };
            Resolution {
                target: SceneId::from(target),
                effect: None,
            }
        }
        Directive::ProsecutionVerdict => {
            let target = if input.professionalism >= VERDICT_THRESHOLD {
                targets::PROSECUTION_GUILTY
            } else {
                targets::PROSECUTION_ACQUITTAL
            };
            Resolution {
                target: SceneId::from(target),
                effect: None,
            }
        }
        Directive::SetFlag { flag, then } => Resolution {
            target: then.clone(),
            effect: Some(Effect::SetFlag(flag.clone())),
        },
    }
}

/// The release-decision formula: accumulated risk plus the argument
/// adjustment. Arguing recognizance backfires against high community
/// harm.
pub fn bail_score(flight_risk: i32, community_harm: i32, argument: Option<BailArgument>) -> i32 {
    let adjustment = match argument {
        Some(BailArgument::Recognizance) => {
            if community_harm > 7 {
                5
            } else {
                -2
            }
        }
        Some(BailArgument::Conditions) => -4,
        Some(BailArgument::Bond) => 1,
        None => 0,
    };
    flight_risk + community_harm + adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn input(flight: i32, harm: i32, professionalism: i32, argument: Option<BailArgument>) -> ResolverInput {
        ResolverInput {
            flight_risk: flight,
            community_harm: harm,
            professionalism,
            argument,
        }
    }

    fn resolve_with(directive: &Directive, input: &ResolverInput) -> Resolution {
        let pool = CasePool::builtin();
        let mut rng = StdRng::seed_from_u64(0);
        resolve(directive, input, &pool, &mut rng)
    }

    #[test]
    fn conditions_argument_reaches_recognizance_release() {
        // 2 + 1 - 4 = -1
        let score = bail_score(2, 1, Some(BailArgument::Conditions));
        assert_eq!(score, -1);
        let resolution = resolve_with(
            &Directive::BailDecision,
            &input(2, 1, 0, Some(BailArgument::Conditions)),
        );
        assert_eq!(resolution.target.as_str(), targets::ROR_RELEASE);
    }

    #[test]
    fn recognizance_argument_backfires_on_high_harm() {
        // 8 + 7 + 5 = 20
        let score = bail_score(8, 7, Some(BailArgument::Recognizance));
        assert_eq!(score, 20);
        let resolution = resolve_with(
            &Directive::BailDecision,
            &input(8, 7, 0, Some(BailArgument::Recognizance)),
        );
        assert_eq!(resolution.target.as_str(), targets::HIGH_BOND);
    }

    #[test]
    fn recognizance_argument_helps_on_moderate_harm() {
        // 3 + 7 - 2 = 8
        assert_eq!(bail_score(3, 7, Some(BailArgument::Recognizance)), 8);
    }

    #[test]
    fn bail_tiers_have_inclusive_boundaries() {
        let tier = |score: i32| {
            let resolution = resolve_with(&Directive::BailDecision, &input(score, 0, 0, None));
            resolution.target
        };
        assert_eq!(tier(2).as_str(), targets::ROR_RELEASE);
        assert_eq!(tier(3).as_str(), targets::STRICT_CONDITIONS);
        assert_eq!(tier(12).as_str(), targets::STRICT_CONDITIONS);
        assert_eq!(tier(13).as_str(), targets::HIGH_BOND);
    }

    #[test]
    fn absent_argument_scores_zero_adjustment() {
        assert_eq!(bail_score(4, 3, None), 7);
        assert_eq!(bail_score(4, 3, Some(BailArgument::Bond)), 8);
    }

    #[test]
    fn defense_verdict_threshold_is_inclusive() {
        let at = resolve_with(&Directive::DefenseVerdict, &input(0, 0, 5, None));
        assert_eq!(at.target.as_str(), targets::ACQUITTAL);
        let below = resolve_with(&Directive::DefenseVerdict, &input(0, 0, 4, None));
        assert_eq!(below.target.as_str(), targets::GUILTY_VERDICT);
    }

    #[test]
    fn prosecution_verdict_mirrors_threshold() {
        let at = resolve_with(&Directive::ProsecutionVerdict, &input(0, 0, 5, None));
        assert_eq!(at.target.as_str(), targets::PROSECUTION_GUILTY);
        let below = resolve_with(&Directive::ProsecutionVerdict, &input(0, 0, 4, None));
        assert_eq!(below.target.as_str(), targets::PROSECUTION_ACQUITTAL);
    }

    #[test]
    fn assign_case_picks_a_profile_and_targets_case_assigned() {
        let resolution = resolve_with(&Directive::AssignCase, &input(0, 0, 0, None));
        assert_eq!(resolution.target.as_str(), targets::CASE_ASSIGNED);
        assert!(matches!(resolution.effect, Some(Effect::AssignCase(_))));
    }

    #[test]
    fn assign_case_with_empty_pool_has_no_effect() {
        let pool = CasePool::default();
        let mut rng = StdRng::seed_from_u64(0);
        let resolution = resolve(&Directive::AssignCase, &input(0, 0, 0, None), &pool, &mut rng);
        assert_eq!(resolution.target.as_str(), targets::CASE_ASSIGNED);
        assert!(resolution.effect.is_none());
    }

    #[test]
    fn set_flag_carries_name_and_continuation() {
        let directive = Directive::SetFlag {
            flag: "limineSuccess".to_string(),
            then: SceneId::from("motionGranted"),
        };
        let resolution = resolve_with(&directive, &input(0, 0, 0, None));
        assert_eq!(resolution.target.as_str(), "motionGranted");
        assert!(
            matches!(resolution.effect, Some(Effect::SetFlag(flag)) if flag == "limineSuccess")
        );
    }

    #[test]
    fn assignment_is_uniform_over_the_pool() {
        let pool = CasePool::builtin();
        let mut rng = StdRng::seed_from_u64(1234);
        let mut counts = vec![0usize; pool.len()];

        for _ in 0..1000 {
            let resolution =
                resolve(&Directive::AssignCase, &input(0, 0, 0, None), &pool, &mut rng);
            let Some(Effect::AssignCase(profile)) = resolution.effect else {
                panic!("expected an assignment effect");
            };
            let index = pool
                .profiles
                .iter()
                .position(|p| *p == profile)
                .unwrap();
            counts[index] += 1;
        }

        for (index, count) in counts.iter().enumerate() {
            assert!(
                (150..=250).contains(count),
                "profile {} drawn {} times out of 1000",
                index,
                count
            );
        }
    }
}
