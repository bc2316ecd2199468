/// Option visibility gating — flag-conditioned choices.

use rustc_hash::FxHashMap;

use crate::schema::scene::ChoiceOption;

/// Returns the options currently selectable, in their original order,
/// paired with their position in the scene's option list so a selection
/// survives filtering. An option is visible when it has no `condition`
/// or its flag is set.
pub fn visible_options<'a>(
    options: &'a [ChoiceOption],
    flags: &FxHashMap<String, bool>,
) -> Vec<(usize, &'a ChoiceOption)> {
    options
        .iter()
        .enumerate()
        .filter(|(_, option)| match &option.condition {
            Some(flag) => flags.get(flag).copied().unwrap_or(false),
            None => true,
        })
        .collect()
}
