use clap::Parser;
use locus_atlas::{
    AggregationEngine, CompletenessValidator, EngineConfig, ProviderRegistry, ResultMerger,
    SourceType, StaticProvider,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Locus Atlas — location data aggregation demo.
///
/// Loads fixture providers from a JSON file, runs one concurrent
/// aggregation pass for the given coordinate, merges the payloads, and
/// prints the overview plus its completeness report as JSON.
///
/// Examples:
///   locus --lat 43.2557 --lon -79.8711 --municipality Hamilton --fixtures demo.json
///   locus --lat 43.2557 --lon -79.8711 -m Hamilton -f demo.json -c config.json
#[derive(Parser)]
#[command(name = "locus", version, about, long_about = None)]
struct Cli {
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Municipality used for provider applicability filtering.
    #[arg(long, short = 'm')]
    municipality: String,

    /// Fixture file: a JSON list of providers with canned payloads.
    #[arg(long, short = 'f')]
    fixtures: PathBuf,

    /// Engine configuration file (JSON). Defaults apply when omitted.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

/// One fixture provider entry.
#[derive(Deserialize)]
struct FixtureProvider {
    name: String,
    source_type: SourceType,
    #[serde(default)]
    regions: Option<Vec<String>>,
    #[serde(default)]
    link: Option<String>,
    payload: Value,
}

#[derive(Deserialize)]
struct FixtureFile {
    providers: Vec<FixtureProvider>,
}

fn load_registry(path: &PathBuf) -> Result<ProviderRegistry, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read fixtures '{}': {}", path.display(), e))?;
    let file: FixtureFile = serde_json::from_str(&data)
        .map_err(|e| format!("Invalid fixtures '{}': {}", path.display(), e))?;

    let mut registry = ProviderRegistry::new();
    for f in file.providers {
        let mut provider = StaticProvider::new(&f.name, f.source_type, f.payload);
        if let Some(regions) = f.regions {
            provider = provider.with_regions(regions);
        }
        if let Some(link) = &f.link {
            provider = provider.with_link(link);
        }
        registry.register(Arc::new(provider));
    }
    Ok(registry)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !(-90.0..=90.0).contains(&cli.lat) || !(-180.0..=180.0).contains(&cli.lon) {
        eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
        std::process::exit(1);
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => EngineConfig::default(),
    };

    let registry = Arc::new(load_registry(&cli.fixtures).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }));

    eprintln!(
        "  Aggregating ({:.4}, {:.4}) in {} across {} registered providers",
        cli.lat,
        cli.lon,
        cli.municipality,
        registry.len()
    );

    let engine = AggregationEngine::new(Arc::clone(&registry), config.clone());
    let aggregation = engine.execute(cli.lat, cli.lon, &cli.municipality).await;

    eprintln!(
        "  {} succeeded, {} failed in {:.0}ms",
        aggregation.providers_succeeded.len(),
        aggregation.providers_failed.len(),
        aggregation.total_time_ms
    );
    for warning in &aggregation.warnings {
        eprintln!("  \u{26A0}\u{FE0F}  {}", warning);
    }

    let merger = ResultMerger::new(&registry, config.max_list_items);
    let overview = merger.merge(cli.lat, cli.lon, &cli.municipality, &aggregation);
    let validation = CompletenessValidator::validate(&overview);

    eprintln!(
        "  Completeness: {:.1}% ({})",
        validation.completeness_score,
        if validation.valid { "valid" } else { "required fields missing" }
    );

    let output = serde_json::json!({
        "overview": overview,
        "validation": validation,
        "aggregation": {
            "providers_succeeded": aggregation.providers_succeeded,
            "providers_failed": aggregation.providers_failed,
            "total_time_ms": aggregation.total_time_ms,
        },
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
