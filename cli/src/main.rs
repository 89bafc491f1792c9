mod suggest;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "dinner")]
#[command(about = "Dinner ideas from what is already in the kitchen", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest dinner recipes that only use pantry ingredients
    Suggest {
        /// Pantry JSON file: {"inventory": [{"name", "quantity"}], "dietary_restrictions": [...]}.
        /// Wins over --pantry-url
        #[arg(long, required_unless_present = "pantry_url")]
        pantry: Option<PathBuf>,
        /// Base URL of the pantry service (e.g. http://localhost:8000/api/pantry)
        #[arg(long, env = "DINNER_PANTRY_URL")]
        pantry_url: Option<String>,
        /// User whose pantry to read
        #[arg(long, default_value = "1")]
        user: String,
        /// Number of recipes to suggest (clamped to 1-10)
        #[arg(long, default_value = "3")]
        count: usize,
        /// Restriction tag replacing the stored ones (repeatable)
        #[arg(long = "restriction")]
        restrictions: Vec<String>,
        /// Skip image providers and use placeholder images
        #[arg(long)]
        no_images: bool,
    },
    /// Check recipes in a JSON file against a pantry
    Validate {
        /// Pantry JSON file
        #[arg(long)]
        pantry: PathBuf,
        /// Recipe JSON: one recipe, an array, or {"recipes": [...]}
        #[arg(long)]
        recipe: PathBuf,
        /// Extra restriction tag (repeatable)
        #[arg(long = "restriction")]
        restrictions: Vec<String>,
        /// Only check the pantry, ignore restrictions
        #[arg(long)]
        lenient: bool,
    },
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Suggest {
            pantry,
            pantry_url,
            user,
            count,
            restrictions,
            no_images,
        } => {
            suggest::suggest(suggest::SuggestArgs {
                pantry,
                pantry_url,
                user,
                count,
                restrictions,
                no_images,
            })
            .await?;
        }
        Commands::Validate {
            pantry,
            recipe,
            restrictions,
            lenient,
        } => {
            validate::validate(&pantry, &recipe, &restrictions, !lenient).await?;
        }
    }

    Ok(())
}
