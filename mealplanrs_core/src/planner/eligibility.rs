//! Decides whether a recipe may be assigned to a slot at all
use crate::nutrition::recipe::{MealType, Recipe};

/// Whether `recipe` may fill slot `slot_index` of any day
///
/// Unrestricted recipes (no meal types, or three and more) fit every slot. Slots past the
/// named vocabulary accept every recipe.
pub fn is_eligible(recipe: &Recipe, slot_index: usize) -> bool {
    if recipe.is_unrestricted() {
        return true;
    }
    match MealType::for_slot(slot_index) {
        Some(meal_type) => recipe.meal_types.contains(&meal_type),
        None => true,
    }
}
