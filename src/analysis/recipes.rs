//! Canned ingredient lists for each drink category.

use super::classifier::FALLBACK_LABEL;

const DRINK_RECIPES: &[(&str, &str)] = &[
    (
        "classic_milk_tea",
        "black tea, whole milk, sugar syrup, tapioca pearls",
    ),
    (
        "taro_milk_tea",
        "taro powder, whole milk, sugar syrup, tapioca pearls",
    ),
    ("fruit_tea", "green tea, fruit juice, fresh fruit, sugar syrup"),
    ("matcha_milk_tea", "matcha powder, whole milk, sugar syrup"),
    (
        "brown_sugar_milk_tea",
        "whole milk, brown sugar syrup, tapioca pearls",
    ),
    (FALLBACK_LABEL, DEFAULT_RECIPE),
];

/// Ingredient string used for any label without its own recipe.
pub const DEFAULT_RECIPE: &str = "milk tea";

/// Returns the ingredient list for a drink label.
pub fn recipe_for_label(label: &str) -> &'static str {
    DRINK_RECIPES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, recipe)| *recipe)
        .unwrap_or(DEFAULT_RECIPE)
}

/// Labels with a dedicated recipe, fallback included.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    DRINK_RECIPES.iter().map(|(label, _)| *label)
}
