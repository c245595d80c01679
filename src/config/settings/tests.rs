use super::*;
use serial_test::serial;
use tempfile::TempDir;

fn config_in(dir: &Path) -> Config {
    Config {
        base_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "all-minilm:latest");
    assert_eq!(config.generation.provider, GenerationProvider::Ollama);
    assert!(config.generation.temperature.abs() < f32::EPSILON);
    assert_eq!(config.generation.condense_max_tokens, 350);
    assert_eq!(config.generation.answer_max_tokens, 500);
    assert_eq!(config.chunking.chunk_size, 1200);
    assert_eq!(config.chunking.chunk_overlap, 250);
    assert_eq!(config.retrieval.top_k, 15);
    assert_eq!(config.retrieval.fallback_min_results, 5);
    assert_eq!(config.retrieval.max_distance, None);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.generation.temperature = 3.5;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTemperature(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.generation.answer_max_tokens = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTokenBudget(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config;
    invalid_config.retrieval.max_distance = Some(-1.0);
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidMaxDistance(_))
    ));
}

#[test]
fn chunk_overlap_must_be_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 500;
    config.chunking.chunk_overlap = 500;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge(500, 500))
    ));

    config.chunking.chunk_overlap = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn fallback_threshold_cannot_exceed_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 3;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidFallbackThreshold(5, 3))
    ));
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config {
        base_dir: PathBuf::new(),
        ..Config::default()
    };
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn api_key_is_not_serialized_when_absent() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    assert!(!toml_str.contains("api_key"));
    assert!(!toml_str.contains("max_distance"));
}

#[test]
fn provider_parses_lowercase() {
    let toml_str = r#"
        [ollama]
        model = "all-minilm:latest"

        [generation]
        provider = "gemini"
        model = "gemini-2.0-flash"
    "#;

    let config: Config = toml::from_str(toml_str).expect("should parse toml correctly");
    assert_eq!(config.generation.provider, GenerationProvider::Gemini);
    assert_eq!(config.generation.model, "gemini-2.0-flash");
    assert_eq!(config.generation.answer_max_tokens, 500);
    assert_eq!(config.generation.provider.to_string(), "gemini");
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
}

#[test]
fn save_and_load_from_directory() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(temp_dir.path());
    config.generation.provider = GenerationProvider::Gemini;
    config.generation.model = "gemini-2.0-flash".to_string();
    config.chunking.chunk_size = 800;
    config.chunking.chunk_overlap = 100;

    config.save().expect("should save config");
    assert!(temp_dir.path().join("config.toml").exists());

    let loaded = Config::load_from(temp_dir.path()).expect("should load config");
    assert_eq!(loaded, config);
}

#[test]
fn load_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load_from(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.index_dir(), temp_dir.path().join("indexes"));
    assert_eq!(config.database_path(), temp_dir.path().join("catalog.db"));
}

#[test]
fn load_rejects_invalid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\nport = 0\n",
    )
    .expect("should write config");

    assert!(Config::load_from(temp_dir.path()).is_err());
}

#[test]
#[serial]
fn config_dir_honours_environment_override() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    // SAFETY: tests touching the environment are serialized
    unsafe { std::env::set_var(HOME_ENV_VAR, temp_dir.path()) };

    let dir = Config::config_dir().expect("should resolve config dir");

    unsafe { std::env::remove_var(HOME_ENV_VAR) };
    assert_eq!(dir, temp_dir.path());
}

#[test]
#[serial]
fn api_key_prefers_config_over_environment() {
    let mut generation = GenerationConfig {
        api_key: Some("from-config".to_string()),
        ..GenerationConfig::default()
    };
    // SAFETY: tests touching the environment are serialized
    unsafe { std::env::set_var(GOOGLE_API_KEY_ENV_VAR, "from-env") };

    assert_eq!(
        generation.resolve_api_key().expect("key resolves"),
        "from-config"
    );

    generation.api_key = Some("   ".to_string());
    assert_eq!(
        generation.resolve_api_key().expect("key resolves"),
        "from-env"
    );

    unsafe { std::env::remove_var(GOOGLE_API_KEY_ENV_VAR) };
    assert!(matches!(
        generation.resolve_api_key(),
        Err(ConfigError::MissingApiKey)
    ));
}
