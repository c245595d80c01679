// Configuration management module
// Handles TOML configuration for the embedding service, generation backend,
// chunking and retrieval

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, GOOGLE_API_KEY_ENV_VAR, GenerationConfig, GenerationProvider,
    HOME_ENV_VAR, OllamaConfig, RetrievalConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
