//! Prompt template for inventory-constrained recipe generation.

use crate::restrictions::display_label;
use crate::validate::STAPLES;

/// Render the generation prompt.
///
/// `forbidden` holds ingredients that sank earlier candidates, either missing
/// from the pantry or ruled out by a restriction; they are called out
/// explicitly so the model stops reaching for them.
pub fn render_generation_prompt(
    available: &[String],
    restrictions: &[String],
    count: usize,
    forbidden: &[String],
) -> String {
    let staples = STAPLES.join(", ");

    let pantry_section = if available.is_empty() {
        format!(
            "The pantry is EMPTY. You may only use these staples: {staples}.\n\
             If no real dinner can be made from staples alone, return an empty array []."
        )
    } else {
        let items = available
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Available ingredients (use ONLY these, spelled as written):\n{items}\n\n\
             Always allowed staples: {staples}."
        )
    };

    let restriction_section = if restrictions.is_empty() {
        "Dietary restrictions: none.".to_string()
    } else {
        let labels = restrictions
            .iter()
            .map(|r| display_label(r))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Dietary restrictions (every recipe MUST comply): {labels}.\n\
             Do not use any ingredient that violates these, even if it is in the pantry."
        )
    };

    let forbidden_section = if forbidden.is_empty() {
        String::new()
    } else {
        format!(
            "\nFORBIDDEN ingredients (rejected in earlier suggestions, either not in the pantry \
             or ruled out by the dietary restrictions; never use them in any form): {}.\n",
            forbidden.join(", ")
        )
    };

    let plural = if count == 1 { "recipe" } else { "recipes" };

    format!(
        r#"You are planning dinner for a busy household using only what is already in their kitchen.

{pantry_section}

{restriction_section}
{forbidden_section}
Rules:
- Every ingredient in every recipe must come from the available list or the staples. Do not add oils, spices, sauces, dairy or anything else that is not listed.
- Suggest exactly {count} distinct dinner {plural} if feasible; fewer only if the pantry cannot support {count}.
- Each recipe has at most 5 short, clear steps.
- Nutrition values are per serving estimates.
- imageSearchHint is a short phrase describing how the finished dish looks.

Respond with a JSON array only. No markdown, no code fences, no commentary. Each element:
{{
  "name": "string",
  "servings": integer,
  "readyInMinutes": integer,
  "calories": number,
  "protein": number,
  "carbs": number,
  "fat": number,
  "ingredients": [{{"name": "string", "amount": number, "unit": "string"}}],
  "steps": ["string"],
  "imageSearchHint": "string"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_prompt_lists_inputs_verbatim() {
        let prompt = render_generation_prompt(
            &strings(&["Chicken Breast", "Broccoli"]),
            &strings(&["gluten_free"]),
            3,
            &[],
        );

        assert!(prompt.contains("- Chicken Breast"));
        assert!(prompt.contains("- Broccoli"));
        assert!(prompt.contains("gluten free"));
        assert!(prompt.contains("exactly 3 distinct dinner recipes"));
        assert!(prompt.contains("JSON array only"));
        assert!(!prompt.contains("FORBIDDEN"));
    }

    #[test]
    fn test_render_prompt_with_forbidden() {
        let prompt = render_generation_prompt(
            &strings(&["Pasta", "Eggs"]),
            &[],
            1,
            &strings(&["milk", "parmesan"]),
        );

        assert!(prompt.contains("FORBIDDEN ingredients"));
        assert!(prompt.contains("milk, parmesan"));
        assert!(prompt.contains("ruled out by the dietary restrictions"));
        assert!(!prompt.contains("does NOT have"));
        assert!(prompt.contains("exactly 1 distinct dinner recipe "));
        assert!(prompt.contains("Dietary restrictions: none."));
    }

    #[test]
    fn test_render_prompt_empty_pantry() {
        let prompt = render_generation_prompt(&[], &[], 2, &[]);

        assert!(prompt.contains("The pantry is EMPTY"));
        assert!(prompt.contains("water, salt"));
        assert!(prompt.contains("return an empty array []"));
    }
}
