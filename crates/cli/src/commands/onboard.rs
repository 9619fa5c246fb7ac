//! `lodestar onboard` — Write a starter config file.

use lodestar_config::Config;

const CONFIG_TEMPLATE: &str = r#"# Lodestar configuration

[general]
# Default model as "provider:model". Providers: ollama, openai, anthropic.
default_model = "ollama:llama3.2"
# Search sources available by default: web, academic, social.
enabled_sources = ["web"]
# Optional instructions prefixed to every answer prompt.
# system_instructions = "Answer briefly."

[search]
# SearXNG instance URL. Must have format=json enabled.
searxng_url = "http://localhost:4000"
timeout_secs = 30
language = "en"

[providers.ollama]
host = "http://localhost:11434"

[providers.openai]
# api_key = "sk-..."            # or set OPENAI_API_KEY
base_url = "https://api.openai.com/v1"

[providers.anthropic]
# api_key = "sk-ant-..."        # or set ANTHROPIC_API_KEY
base_url = "https://api.anthropic.com"

# Per-mode evidence budgets. max_iterations > 0 enables the refinement loop.
[modes.speed]
max_iterations = 0
max_results = 5

[modes.balanced]
max_iterations = 0
max_results = 10

[modes.quality]
max_iterations = 25
max_results = 15
"#;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = Config::config_dir();
    let config_path = Config::config_path();

    println!("Lodestar — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  ✅ Created config directory: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("  ⚠️  Config already exists at: {}", config_path.display());
        println!("     Re-run with --force to overwrite.");
        return Err("config file already exists".into());
    }

    std::fs::write(&config_path, CONFIG_TEMPLATE)?;
    println!("  ✅ Wrote config to: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {} for your setup", config_path.display());
    println!("  2. Run: lodestar doctor");
    println!("  3. Run: lodestar search \"your question\"");

    Ok(())
}
