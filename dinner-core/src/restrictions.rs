//! Dietary restriction vocabulary.
//!
//! Restrictions reach the core as opaque tags. Known tags map to ingredient
//! keywords they exclude, which the validator can use as a post-check on top
//! of the prompt instruction. Unknown tags are only passed to the prompt.

/// Tags understood by the pantry service.
pub const KNOWN_RESTRICTIONS: &[&str] = &[
    "gluten_free",
    "dairy_free",
    "nut_free",
    "egg_free",
    "soy_free",
    "shellfish_free",
    "fish_free",
    "pork_free",
    "vegetarian",
    "vegan",
    "halal",
    "kosher",
    "low_carb",
    "keto",
];

const GLUTEN: &[&str] = &[
    "flour", "bread", "pasta", "noodle", "wheat", "barley", "rye", "couscous", "tortilla",
    "cracker", "breadcrumb", "soy sauce",
];
const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "ghee", "parmesan", "mozzarella",
    "cheddar", "ricotta", "buttermilk",
];
/// Words that turn a dairy term into a plant product ("coconut milk", "peanut butter").
const PLANT_QUALIFIERS: &[&str] = &[
    "almond", "cashew", "coconut", "cocoa", "hemp", "nut", "oat", "peanut", "plant", "rice",
    "shea", "soy", "sunflower", "vegan",
];
const NUTS: &[&str] = &[
    "peanut", "almond", "cashew", "walnut", "pecan", "pistachio", "hazelnut", "macadamia",
];
const EGG: &[&str] = &["egg", "mayonnaise"];
const SOY: &[&str] = &["soy", "tofu", "tempeh", "edamame", "miso"];
const SHELLFISH: &[&str] = &["shrimp", "prawn", "crab", "lobster", "clam", "mussel", "oyster", "scallop"];
const FISH: &[&str] = &["fish", "salmon", "tuna", "cod", "tilapia", "anchovy", "sardine", "trout"];
const PORK: &[&str] = &["pork", "bacon", "ham", "prosciutto", "pancetta", "chorizo", "sausage"];
const MEAT: &[&str] = &[
    "chicken", "beef", "pork", "bacon", "ham", "lamb", "turkey", "sausage", "steak", "veal",
    "duck", "prosciutto", "pancetta", "chorizo",
];
const ANIMAL_EXTRAS: &[&str] = &["honey", "gelatin"];
const HIGH_CARB: &[&str] = &[
    "rice", "pasta", "noodle", "bread", "potato", "flour", "sugar", "tortilla", "couscous",
];

/// Ingredient keywords excluded by a restriction tag. Unknown tags exclude nothing.
///
/// Tags are matched case-insensitively and accept `-` or space in place of `_`.
pub fn excluded_keywords(tag: &str) -> Vec<&'static str> {
    let normalized = tag.trim().to_lowercase().replace(['-', ' '], "_");

    let groups: &[&[&'static str]] = match normalized.as_str() {
        "gluten_free" => &[GLUTEN],
        "dairy_free" => &[DAIRY],
        "nut_free" => &[NUTS],
        "egg_free" => &[EGG],
        "soy_free" => &[SOY],
        "shellfish_free" => &[SHELLFISH],
        "fish_free" => &[FISH],
        "pork_free" | "halal" => &[PORK],
        "kosher" => &[PORK, SHELLFISH],
        "vegetarian" => &[MEAT, FISH, SHELLFISH],
        "vegan" => &[MEAT, FISH, SHELLFISH, DAIRY, EGG, ANIMAL_EXTRAS],
        "low_carb" | "keto" => &[HIGH_CARB],
        _ => &[],
    };

    groups.iter().flat_map(|g| g.iter().copied()).collect()
}

/// Human-readable label for prompts ("gluten_free" -> "gluten free").
pub fn display_label(tag: &str) -> String {
    tag.trim().replace('_', " ")
}

/// True if `ingredient` contains a keyword excluded by any of `restrictions`.
///
/// `ingredient` is expected to be normalized (lowercase, trimmed). Single-word
/// keywords match whole words or their plurals so "eggplant" is not an egg;
/// multi-word keywords match as substrings. A dairy word right after a plant
/// qualifier ("coconut milk", "peanut butter") is not dairy.
pub fn violates(ingredient: &str, restrictions: &[String]) -> bool {
    restrictions
        .iter()
        .flat_map(|tag| excluded_keywords(tag))
        .any(|keyword| keyword_hits(ingredient, keyword))
}

fn keyword_hits(ingredient: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return ingredient.contains(keyword);
    }

    let words: Vec<&str> = ingredient
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words.iter().enumerate().any(|(i, word)| {
        let hit = *word == keyword
            || word
                .strip_prefix(keyword)
                .is_some_and(|rest| rest == "s" || rest == "es");
        hit && !(DAIRY.contains(&keyword) && i > 0 && is_plant_qualifier(words[i - 1]))
    })
}

fn is_plant_qualifier(word: &str) -> bool {
    PLANT_QUALIFIERS.contains(&word)
        || word
            .strip_suffix('s')
            .is_some_and(|w| PLANT_QUALIFIERS.contains(&w))
}
