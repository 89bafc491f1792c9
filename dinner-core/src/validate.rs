//! Inventory validation for generated recipes.
//!
//! Pure and deterministic: no I/O, no model calls. A candidate passes only if
//! every ingredient is a staple or matches something in the pantry.

use crate::restrictions;
use crate::types::RecipeCandidate;

/// Ingredients that are always permitted, whatever the pantry holds.
///
/// Only "black pepper" is listed; a bare "pepper" may be a bell or chili pepper
/// and has to come from the pantry.
pub const STAPLES: &[&str] = &["water", "salt", "black pepper"];

/// Preparation and size words that say nothing about what the ingredient is.
const DESCRIPTORS: &[&str] = &[
    "baked", "beaten", "boiled", "boneless", "chopped", "cooked", "crushed", "cubed", "diced",
    "dried", "fresh", "fried", "frozen", "grated", "grilled", "halved", "large", "leftover",
    "mashed", "medium", "melted", "minced", "organic", "peeled", "raw", "roasted", "sauteed",
    "shredded", "skinless", "sliced", "small", "softened", "steamed", "toasted", "whole",
];

/// True if `name` (any case, any surrounding whitespace) is a staple.
pub fn is_staple(name: &str) -> bool {
    let normalized = normalize(name);
    STAPLES.contains(&normalized.as_str())
}

/// Lowercase and trim an ingredient name.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drop descriptor words from a normalized name ("grilled chicken" -> "chicken").
fn core_name(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty() && !DESCRIPTORS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn substring_either_way(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[derive(Debug, Clone)]
struct PantryName {
    full: String,
    core: String,
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not a staple and nothing in the pantry matches it.
    NotInInventory,
    /// Excluded by one of the user's dietary restrictions.
    Restricted,
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected {
        /// The first failing ingredient, normalized.
        ingredient: String,
        reason: RejectReason,
    },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn offending_ingredient(&self) -> Option<&str> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected { ingredient, .. } => Some(ingredient),
        }
    }
}

/// Check a candidate against the available ingredients only.
///
/// An ingredient matches when its normalized name contains an inventory name
/// or is contained by one ("chicken" vs "Chicken Breast", "grilled chicken"
/// vs "chicken"). If that fails, the same test runs again with preparation
/// words removed from both sides, so "grilled chicken" matches "Chicken
/// Breast". Blank names are skipped. Stops at the first failure.
pub fn validate(candidate: &RecipeCandidate, available: &[String]) -> Verdict {
    Validator::new(available, &[], false).check(candidate)
}

/// Validator bound to one request's pantry and restrictions.
#[derive(Debug, Clone)]
pub struct Validator {
    inventory: Vec<PantryName>,
    restrictions: Vec<String>,
    strict_restrictions: bool,
}

impl Validator {
    pub fn new(available: &[String], restrictions: &[String], strict_restrictions: bool) -> Self {
        Self {
            inventory: available
                .iter()
                .map(|name| normalize(name))
                .filter(|name| !name.is_empty())
                .map(|full| PantryName {
                    core: core_name(&full),
                    full,
                })
                .collect(),
            restrictions: restrictions.to_vec(),
            strict_restrictions,
        }
    }

    /// True if `ingredient` (normalized) is in the pantry by the substring rule.
    pub fn in_inventory(&self, ingredient: &str) -> bool {
        if self
            .inventory
            .iter()
            .any(|item| substring_either_way(&item.full, ingredient))
        {
            return true;
        }

        let core = core_name(ingredient);
        if core.is_empty() {
            return false;
        }

        self.inventory
            .iter()
            .any(|item| !item.core.is_empty() && substring_either_way(&item.core, &core))
    }

    pub fn check(&self, candidate: &RecipeCandidate) -> Verdict {
        for ingredient in &candidate.ingredients {
            let name = normalize(&ingredient.name);
            if name.is_empty() || STAPLES.contains(&name.as_str()) {
                continue;
            }

            if self.strict_restrictions && restrictions::violates(&name, &self.restrictions) {
                return Verdict::Rejected {
                    ingredient: name,
                    reason: RejectReason::Restricted,
                };
            }

            if !self.in_inventory(&name) {
                return Verdict::Rejected {
                    ingredient: name,
                    reason: RejectReason::NotInInventory,
                };
            }
        }

        Verdict::Accepted
    }
}
