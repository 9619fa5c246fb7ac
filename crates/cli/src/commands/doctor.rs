//! `lodestar doctor` — Diagnose configuration and backend health.

use std::path::PathBuf;

use lodestar_config::Config;
use lodestar_core::message::ChatMessage;
use lodestar_core::provider::GenerateRequest;
use lodestar_core::search::EvidenceSource;
use lodestar_providers::ModelRegistry;
use lodestar_search::SearxngClient;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Lodestar Doctor — Health Checks");
    println!("===============================\n");

    let mut failures = 0;

    // Check config
    let config = match config_path {
        Some(path) => Config::load_at(&path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => {
            println!("  ✅ Config loaded and valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            return Err("1 check(s) failed".into());
        }
    };

    // Check SearXNG reachability with a tiny probe search
    let search = SearxngClient::new(
        &config.search.searxng_url,
        config.search.language.clone(),
        config.search.timeout_secs,
    );
    match search.search("lodestar health check", None, 1).await {
        Ok(_) => println!("  ✅ SearXNG reachable at {}", config.search.searxng_url),
        Err(e) => {
            println!("  ❌ SearXNG unreachable: {e}");
            failures += 1;
        }
    }

    // Check model resolution and a one-token probe generation
    let registry = ModelRegistry::new(config.clone());
    match registry.resolve(None) {
        Ok(resolved) => {
            println!("  ✅ Model resolved: {}", config.general.default_model);

            let request = GenerateRequest::new(
                &resolved.model,
                vec![ChatMessage::user("Say OK.")],
            )
            .with_max_tokens(1);

            match resolved.provider.generate(request).await {
                Ok(_) => println!("  ✅ Model responds"),
                Err(e) => {
                    println!("  ❌ Model call failed: {e}");
                    failures += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Model resolution failed: {e}");
            failures += 1;
        }
    }

    println!();
    if failures == 0 {
        println!("  All checks passed.");
        Ok(())
    } else {
        Err(format!("{failures} check(s) failed").into())
    }
}
