use anyhow::{Context, Result};
use dinner_core::generate::parse_candidates;
use dinner_core::{PantryProvider, RejectReason, StaticPantry, Validator, Verdict};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct Report {
    recipe: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    offending_ingredient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

pub async fn validate(
    pantry_path: &Path,
    recipe_path: &Path,
    extra_restrictions: &[String],
    strict: bool,
) -> Result<()> {
    let pantry = StaticPantry::from_json_file(pantry_path)
        .with_context(|| format!("loading pantry from {}", pantry_path.display()))?;

    let available = pantry.available_ingredients("local").await?;
    let mut restrictions = pantry.dietary_restrictions("local").await?;
    restrictions.extend(extra_restrictions.iter().cloned());

    let text = std::fs::read_to_string(recipe_path)
        .with_context(|| format!("reading {}", recipe_path.display()))?;
    let candidates = parse_candidates(&as_recipe_list(&text)?, "file")
        .with_context(|| format!("parsing {}", recipe_path.display()))?;

    let validator = Validator::new(&available, &restrictions, strict);
    let reports: Vec<Report> = candidates
        .iter()
        .map(|candidate| match validator.check(candidate) {
            Verdict::Accepted => Report {
                recipe: candidate.name.clone(),
                valid: true,
                offending_ingredient: None,
                reason: None,
            },
            Verdict::Rejected { ingredient, reason } => Report {
                recipe: candidate.name.clone(),
                valid: false,
                offending_ingredient: Some(ingredient),
                reason: Some(match reason {
                    RejectReason::NotInInventory => "not in pantry",
                    RejectReason::Restricted => "excluded by dietary restriction",
                }),
            },
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Wrap a single recipe object in an array so the model-output decoder accepts it.
fn as_recipe_list(text: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(text).context("recipe file is not JSON")?;
    Ok(match value {
        serde_json::Value::Object(map) if !map.contains_key("recipes") => {
            serde_json::to_string(&[serde_json::Value::Object(map)])?
        }
        _ => text.to_string(),
    })
}
