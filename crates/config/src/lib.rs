//! Configuration loading, validation, and management for lodestar.
//!
//! Loads configuration from `~/.lodestar/config.toml` with environment
//! variable overrides applied on top. Validates all settings at startup.
//! A missing config file is not an error; built-in defaults apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.lodestar/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub search: SearchConfig,
    pub providers: ProvidersConfig,
    pub modes: ModesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default model as a "provider:model" spec.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// System instructions prefixed to every synthesis prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instructions: Option<String>,

    /// Search sources available to requests that don't name their own.
    #[serde(default = "default_sources")]
    pub enabled_sources: Vec<String>,
}

fn default_model() -> String {
    "ollama:llama3.2".into()
}
fn default_sources() -> Vec<String> {
    vec!["web".into()]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            system_instructions: None,
            enabled_sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SearXNG instance base URL.
    #[serde(default = "default_searxng_url")]
    pub searxng_url: String,

    /// Per-request timeout for search calls, in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Search language code.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_searxng_url() -> String {
    "http://localhost:4000".into()
}
fn default_search_timeout() -> u64 {
    30
}
fn default_language() -> String {
    "en".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            searxng_url: default_searxng_url(),
            timeout_secs: default_search_timeout(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_host")]
    pub host: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".into()
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_anthropic_base_url(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Per-mode budgets for the evidence gatherer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Refinement iteration budget. Zero disables the refinement loop.
    pub max_iterations: u32,

    /// Result cap per initial search call.
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub speed: ModeConfig,
    pub balanced: ModeConfig,
    pub quality: ModeConfig,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            speed: ModeConfig {
                max_iterations: 0,
                max_results: 5,
            },
            balanced: ModeConfig {
                max_iterations: 0,
                max_results: 10,
            },
            quality: ModeConfig {
                max_iterations: 25,
                max_results: 15,
            },
        }
    }
}

impl ModesConfig {
    pub fn get(&self, mode: OptimizationMode) -> ModeConfig {
        match mode {
            OptimizationMode::Speed => self.speed,
            OptimizationMode::Balanced => self.balanced,
            OptimizationMode::Quality => self.quality,
        }
    }
}

/// The named optimization modes a request can select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    Speed,
    #[default]
    Balanced,
    Quality,
}

impl OptimizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationMode::Speed => "speed",
            OptimizationMode::Balanced => "balanced",
            OptimizationMode::Quality => "quality",
        }
    }
}

impl std::fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptimizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speed" => Ok(OptimizationMode::Speed),
            "balanced" => Ok(OptimizationMode::Balanced),
            "quality" => Ok(OptimizationMode::Quality),
            other => Err(format!(
                "unknown mode '{other}' (expected speed, balanced, or quality)"
            )),
        }
    }
}

/// A parsed "provider:model" configuration string.
///
/// Absent a separator the provider defaults to `ollama` and the whole
/// string is the model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl ModelSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((provider, model)) => Self {
                provider: provider.to_string(),
                model: model.to_string(),
            },
            None => Self {
                provider: "ollama".into(),
                model: spec.to_string(),
            },
        }
    }

    /// Canonical "provider:model" form, used as a cache key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

impl Config {
    /// Load configuration from the default path (~/.lodestar/config.toml),
    /// then apply environment variable overrides:
    /// - `LODESTAR_DEFAULT_MODEL`
    /// - `SEARXNG_URL`
    /// - `OLLAMA_HOST`
    /// - `OPENAI_API_KEY`
    /// - `ANTHROPIC_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, with the same env
    /// overrides as `load`.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file without env overrides. A missing file
    /// yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("LODESTAR_DEFAULT_MODEL") {
            self.general.default_model = model;
        }
        if let Ok(url) = std::env::var("SEARXNG_URL") {
            self.search.searxng_url = url;
        }
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.providers.ollama.host = host;
        }
        if self.providers.openai.api_key.is_none() {
            self.providers.openai.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.providers.anthropic.api_key.is_none() {
            self.providers.anthropic.api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lodestar")
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "general.default_model must not be empty".into(),
            ));
        }

        if self.search.searxng_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "search.searxng_url must not be empty".into(),
            ));
        }

        if self.search.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "search.timeout_secs must be nonzero".into(),
            ));
        }

        for (name, mode) in [
            ("speed", self.modes.speed),
            ("balanced", self.modes.balanced),
            ("quality", self.modes.quality),
        ] {
            if mode.max_results < 1 {
                return Err(ConfigError::ValidationError(format!(
                    "modes.{name}.max_results must be at least 1"
                )));
            }
        }

        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.default_model, "ollama:llama3.2");
        assert_eq!(config.general.enabled_sources, vec!["web".to_string()]);
        assert_eq!(config.search.searxng_url, "http://localhost:4000");
    }

    #[test]
    fn default_modes_only_quality_refines() {
        let modes = ModesConfig::default();
        assert_eq!(modes.speed.max_iterations, 0);
        assert_eq!(modes.balanced.max_iterations, 0);
        assert_eq!(modes.quality.max_iterations, 25);
        assert_eq!(modes.quality.max_results, 15);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.general.default_model, config.general.default_model);
        assert_eq!(parsed.modes.quality.max_iterations, 25);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[general]
default_model = "anthropic:claude-sonnet-4-20250514"

[modes.balanced]
max_iterations = 3
max_results = 8
"#,
        )
        .unwrap();
        assert_eq!(
            parsed.general.default_model,
            "anthropic:claude-sonnet-4-20250514"
        );
        assert_eq!(parsed.modes.balanced.max_iterations, 3);
        // Untouched sections keep their defaults
        assert_eq!(parsed.search.timeout_secs, 30);
        assert_eq!(parsed.modes.quality.max_iterations, 25);
    }

    #[test]
    fn zero_max_results_rejected() {
        let mut config = Config::default();
        config.modes.speed.max_results = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nsearxng_url = \"http://searx.local\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search.searxng_url, "http://searx.local");
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.general.default_model, "ollama:llama3.2");
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        unsafe {
            std::env::set_var("LODESTAR_DEFAULT_MODEL", "openai:gpt-4o-mini");
            std::env::set_var("SEARXNG_URL", "http://searx.env:8080");
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.general.default_model, "openai:gpt-4o-mini");
        assert_eq!(config.search.searxng_url, "http://searx.env:8080");

        unsafe {
            std::env::remove_var("LODESTAR_DEFAULT_MODEL");
            std::env::remove_var("SEARXNG_URL");
        }
    }

    #[test]
    fn debug_redacts_api_keys() {
        let config = OpenAiConfig {
            api_key: Some("sk-secret".into()),
            base_url: default_openai_base_url(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn model_spec_with_provider() {
        let spec = ModelSpec::parse("anthropic:claude-sonnet-4-20250514");
        assert_eq!(spec.provider, "anthropic");
        assert_eq!(spec.model, "claude-sonnet-4-20250514");
        assert_eq!(spec.key(), "anthropic:claude-sonnet-4-20250514");
    }

    #[test]
    fn model_spec_without_provider_defaults_to_ollama() {
        let spec = ModelSpec::parse("llama3.2");
        assert_eq!(spec.provider, "ollama");
        assert_eq!(spec.model, "llama3.2");
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("speed".parse(), Ok(OptimizationMode::Speed));
        assert_eq!("quality".parse(), Ok(OptimizationMode::Quality));
        assert!("turbo".parse::<OptimizationMode>().is_err());
    }
}
