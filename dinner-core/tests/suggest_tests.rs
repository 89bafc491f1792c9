//! End-to-end tests for the suggestion loop, driven by stub generators.

use async_trait::async_trait;
use dinner_core::{
    fallback_image_url, validate, CandidateGenerator, GenerateError, GenerationRequest,
    ImageEnricher, ImageError, ImageProvider, InventoryItem, LlmError, LlmRecipeGenerator,
    PantryError, PantryProvider, RecipeCandidate, RecipeIngredient, RecipeSuggester,
    StaticPantry, SuggestConfig, SuggestError,
};
use dinner_core::generate::ParseError;
use dinner_core::llm::FakeProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Reply = Result<Vec<RecipeCandidate>, GenerateError>;

/// Generator whose reply is computed from the call number (0-based) and request.
struct FnGenerator<F> {
    reply: F,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl<F> FnGenerator<F>
where
    F: Fn(usize, &GenerationRequest) -> Reply + Send + Sync,
{
    fn new(reply: F) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> CandidateGenerator for FnGenerator<F>
where
    F: Fn(usize, &GenerationRequest) -> Reply + Send + Sync,
{
    async fn generate(&self, request: &GenerationRequest) -> Reply {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.reply)(call, request)
    }
}

/// Sleeps on the first call, then returns one valid recipe.
struct SlowFirstGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl CandidateGenerator for SlowFirstGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Reply {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(vec![recipe("Pasta Bake", &["pasta", "eggs"])])
    }
}

struct DownPantry;

#[async_trait]
impl PantryProvider for DownPantry {
    async fn available_ingredients(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        Err(PantryError::RequestFailed("connection refused".to_string()))
    }

    async fn dietary_restrictions(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        Err(PantryError::RequestFailed("connection refused".to_string()))
    }
}

struct HangingPantry;

#[async_trait]
impl PantryProvider for HangingPantry {
    async fn available_ingredients(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec!["Caviar".to_string()])
    }

    async fn dietary_restrictions(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        Ok(vec!["vegan".to_string()])
    }
}

struct BrokenImages;

#[async_trait]
impl ImageProvider for BrokenImages {
    async fn image_for(&self, _query: &str) -> Result<Option<String>, ImageError> {
        Err(ImageError::RequestFailed("503".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

fn recipe(name: &str, ingredients: &[&str]) -> RecipeCandidate {
    RecipeCandidate::new(
        name,
        ingredients
            .iter()
            .map(|i| RecipeIngredient::new(*i, 1.0, "cup"))
            .collect(),
    )
}

fn pantry_names() -> Vec<String> {
    ["Pasta", "Eggs", "Broccoli", "Butter"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn static_pantry(restrictions: &[&str]) -> Arc<StaticPantry> {
    Arc::new(StaticPantry::new(
        pantry_names()
            .into_iter()
            .map(|n| InventoryItem::new(n, 1.0))
            .chain([InventoryItem::new("Milk", 0.0)])
            .collect(),
        restrictions.iter().map(|s| s.to_string()).collect(),
    ))
}

fn config() -> SuggestConfig {
    SuggestConfig {
        generation_timeout: Duration::from_millis(200),
        image_timeout: Duration::from_millis(200),
        pantry_timeout: Duration::from_millis(200),
        ..SuggestConfig::default()
    }
}

fn suggester(
    pantry: Arc<dyn PantryProvider>,
    generator: Arc<dyn CandidateGenerator>,
) -> RecipeSuggester {
    RecipeSuggester::new(
        config(),
        pantry,
        generator,
        ImageEnricher::new(Arc::new(BrokenImages), Duration::from_millis(200)),
    )
}

#[tokio::test]
async fn shortfall_shrinks_by_one_per_round() {
    let generator = FnGenerator::new(|call, _req| {
        Ok(vec![
            recipe(&format!("Broccoli Pasta {call}"), &["pasta", "broccoli", "salt"]),
            recipe(&format!("Milky Pasta {call}"), &["pasta", "milk"]),
        ])
    });
    let s = suggester(static_pantry(&[]), generator.clone());

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 4, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.accepted.len(), 4);
    assert!(outcome.attempts <= 4);
    assert!(outcome.forbidden.contains("milk"));

    let shortfalls: Vec<usize> = generator.requests().iter().map(|r| r.count).collect();
    assert_eq!(shortfalls, vec![4, 3, 2, 1]);
    assert!(generator.requests()[0].forbidden.is_empty());
    assert_eq!(generator.requests()[1].forbidden, vec!["milk".to_string()]);
}

#[tokio::test]
async fn duplicate_names_are_dropped() {
    let generator = FnGenerator::new(|_call, _req| {
        Ok(vec![
            recipe("Egg Fried Pasta", &["pasta", "eggs"]),
            recipe("  egg fried PASTA ", &["pasta", "eggs", "broccoli"]),
        ])
    });
    let s = suggester(static_pantry(&[]), generator);

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 3, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.attempts, 5);
    assert!(outcome.forbidden.is_empty());
}

#[tokio::test]
async fn exhaustion_returns_empty_then_no_valid_recipe() {
    let generator = FnGenerator::new(|_call, _req| Ok(vec![recipe("Steak Night", &["steak"])]));
    let s = suggester(static_pantry(&[]), generator.clone());

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 2, &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.attempts, 5);

    let err = s
        .get_suggestions("u1", 2, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::NoValidRecipe { attempts: 5 }));
}

#[tokio::test]
async fn failed_rounds_only_cost_their_attempt() {
    let generator = FnGenerator::new(|call, _req| match call {
        0 => Err(GenerateError::Llm(LlmError::RequestFailed("503".to_string()))),
        1 => Err(GenerateError::Parse(ParseError::Malformed("expected value".to_string()))),
        _ => Ok(vec![recipe("Buttered Broccoli", &["broccoli", "butter"])]),
    });
    let s = suggester(static_pantry(&[]), generator);

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 1, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.attempts, 3);
}

#[tokio::test]
async fn undecodable_model_output_is_retried() {
    let provider = Arc::new(FakeProvider::with_script([
        "Sorry, I can't help with that right now.",
        r#"[{"name": "Broken", "ingredients": [{"name": "pasta"}"#,
        r#"[{"name": "Broccoli Pasta", "ingredients": ["Pasta", "Broccoli"]}]"#,
    ]));
    let s = suggester(
        static_pantry(&[]),
        Arc::new(LlmRecipeGenerator::new(provider.clone())),
    );

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 1, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.accepted[0].name, "Broccoli Pasta");
    assert!(outcome.forbidden.is_empty());
    assert_eq!(provider.prompts().len(), 3);
}

#[tokio::test]
async fn plant_milk_passes_vegan_check() {
    let pantry = Arc::new(StaticPantry::new(
        vec![
            InventoryItem::new("Coconut Milk", 1.0),
            InventoryItem::new("Rice", 1.0),
        ],
        vec!["vegan".to_string()],
    ));
    let generator = FnGenerator::new(|_call, _req| {
        Ok(vec![recipe("Coconut Rice", &["coconut milk", "rice", "salt"])])
    });
    let s = suggester(pantry, generator.clone());

    let suggestions = s
        .get_suggestions("u1", 1, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(suggestions.recipes[0].name, "Coconut Rice");
    assert_eq!(suggestions.attempts, 1);
    assert!(generator.requests()[0].forbidden.is_empty());
}

#[tokio::test]
async fn timed_out_round_is_retried() {
    let s = suggester(
        static_pantry(&[]),
        Arc::new(SlowFirstGenerator {
            calls: AtomicUsize::new(0),
        }),
    );

    let outcome = s
        .collect_candidates(&pantry_names(), &[], 1, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test]
async fn forbidden_ingredients_reach_later_prompts() {
    let provider = Arc::new(FakeProvider::with_script([
        r#"[{"name": "Creamy Pasta", "ingredients": [{"name": "pasta"}, {"name": "heavy cream"}]}]"#,
        r#"[{"name": "Pasta Frittata", "ingredients": [{"name": "Pasta"}, {"name": "Eggs"}]}]"#,
    ]));
    let s = suggester(
        static_pantry(&[]),
        Arc::new(LlmRecipeGenerator::new(provider.clone())),
    );

    let suggestions = s
        .get_suggestions("u1", 1, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(suggestions.recipes.len(), 1);
    assert_eq!(suggestions.recipes[0].name, "Pasta Frittata");
    assert_eq!(suggestions.recipes[0].source, "ai:fake");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("FORBIDDEN"));
    assert!(prompts[1].contains("FORBIDDEN"));
    assert!(prompts[1].contains("heavy cream"));
    assert!(!prompts[0].contains("Milk"));
}

#[tokio::test]
async fn pantry_outage_degrades_to_staples() {
    let generator = FnGenerator::new(|_call, req| {
        assert!(req.available.is_empty());
        assert!(req.restrictions.is_empty());
        Ok(vec![recipe("Salt Water", &["water", "salt"])])
    });
    let s = suggester(Arc::new(DownPantry), generator);

    let suggestions = s
        .get_suggestions("u1", 1, None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(suggestions.recipes.len(), 1);
}

#[tokio::test]
async fn slow_pantry_times_out_to_empty_inventory() {
    let generator = FnGenerator::new(|_call, _req| Ok(vec![recipe("Caviar Toast", &["caviar"])]));
    let s = suggester(Arc::new(HangingPantry), generator.clone());

    let err = s
        .get_suggestions("u1", 1, None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SuggestError::NoValidRecipe { .. }));
    let first = &generator.requests()[0];
    assert!(first.available.is_empty());
    assert_eq!(first.restrictions, vec!["vegan"]);
}

#[tokio::test]
async fn allergen_override_replaces_stored_restrictions() {
    let generator = FnGenerator::new(|_call, _req| {
        Ok(vec![
            recipe("Buttered Pasta", &["pasta", "butter"]),
            recipe("Broccoli Pasta", &["pasta", "broccoli"]),
            recipe("Egg Fried Pasta", &["pasta", "eggs"]),
        ])
    });
    let s = suggester(static_pantry(&["vegan"]), generator.clone());

    let suggestions = s
        .get_suggestions(
            "u1",
            3,
            Some(vec!["dairy_free".to_string(), " ".to_string()]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(generator.requests()[0].restrictions, vec!["dairy_free"]);
    let names: Vec<&str> = suggestions.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Broccoli Pasta", "Egg Fried Pasta"]);
    assert_eq!(generator.requests()[1].forbidden, vec!["butter"]);
}

#[tokio::test]
async fn failing_images_still_get_a_url() {
    let generator = FnGenerator::new(|call, _req| {
        Ok(vec![recipe(&format!("Broccoli Pasta {call}"), &["pasta", "broccoli"])])
    });
    let s = suggester(static_pantry(&[]), generator);

    let suggestions = s
        .get_suggestions("u1", 3, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(suggestions.recipes.len(), 3);
    assert!(!suggestions.is_partial());
    for (i, r) in suggestions.recipes.iter().enumerate() {
        assert_eq!(r.name, format!("Broccoli Pasta {i}"));
        assert_eq!(r.image_url, Some(fallback_image_url(&r.name)));
    }
}

#[tokio::test]
async fn partial_result_is_not_an_error() {
    let generator = FnGenerator::new(|call, _req| match call {
        0 => Ok(vec![recipe("Broccoli Pasta", &["pasta", "broccoli"])]),
        _ => Ok(vec![recipe("Lobster Roll", &["lobster", "bread"])]),
    });
    let s = suggester(static_pantry(&[]), generator);

    let suggestions = s
        .get_suggestions("u1", 3, None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(suggestions.recipes.len(), 1);
    assert_eq!(suggestions.requested, 3);
    assert_eq!(suggestions.attempts, 5);
    assert!(suggestions.is_partial());
}

#[tokio::test]
async fn count_is_clamped() {
    let generator = FnGenerator::new(|call, _req| {
        Ok(vec![recipe(&format!("Egg Pasta {call}"), &["pasta", "eggs"])])
    });
    let s = suggester(static_pantry(&[]), generator.clone());

    let suggestions = s
        .get_suggestions("u1", 0, None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(suggestions.requested, 1);
    assert_eq!(generator.requests()[0].count, 1);

    let generator = FnGenerator::new(|_call, _req| Ok(vec![]));
    let s = suggester(static_pantry(&[]), generator.clone());
    let _ = s.get_suggestions("u1", 50, None, &CancellationToken::new()).await;
    assert_eq!(generator.requests()[0].count, s.config().max_count);
}

#[tokio::test]
async fn cancellation_stops_between_rounds() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let generator = FnGenerator::new(move |_call, _req| {
        trigger.cancel();
        Ok(vec![recipe("Steak Night", &["steak"])])
    });
    let s = suggester(static_pantry(&[]), generator.clone());

    let err = s
        .collect_candidates(&pantry_names(), &[], 2, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::Cancelled));
    assert_eq!(generator.requests().len(), 1);

    let err = s
        .get_suggestions("u1", 1, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::Cancelled));
}

#[tokio::test]
async fn accepted_candidates_never_violate_the_pantry() {
    let generator = FnGenerator::new(|call, _req| {
        let menu: [(&str, &[&str]); 6] = [
            ("Broccoli Pasta", &["pasta", "broccoli", "black pepper"]),
            ("Cheesy Pasta", &["pasta", "parmesan"]),
            ("Scrambled Eggs", &["eggs", "butter", "salt"]),
            ("Chicken Stir Fry", &["chicken", "broccoli", "soy sauce"]),
            ("Garlic Eggs", &["eggs", "garlic"]),
            ("Buttered Broccoli", &["Broccoli", "  ", "Butter"]),
        ];
        Ok(menu
            .iter()
            .skip(call % 3)
            .map(|(name, ingredients)| recipe(name, ingredients))
            .collect())
    });
    let s = suggester(static_pantry(&[]), generator);
    let available = pantry_names();

    let outcome = s
        .collect_candidates(&available, &[], 6, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.accepted.is_empty());
    for candidate in &outcome.accepted {
        assert!(
            validate(candidate, &available).is_valid(),
            "{} slipped through",
            candidate.name
        );
    }
    for bad in ["parmesan", "chicken", "garlic"] {
        assert!(outcome.forbidden.contains(bad), "missing {bad}");
    }
}
