#[cfg(test)]
mod tests {
    use crate::config::{
        CacheBackend, CacheConfig, Config, InvokerConfig, LLMConfig, LLMProvider,
    };
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.output_path, PathBuf::from("./blogsmith.out"));
        assert_eq!(config.orchestrator.stage_retries, 1);
        assert_eq!(config.rate_limit.max_concurrent, 4);
        assert!(config.record_store.enabled);
        assert!(config.fetch.enabled);
        assert!(!config.fetch.allow_private_hosts);
        assert!(!config.verbose);
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!(
            "openai".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenAI
        );
        assert_eq!(
            "Anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "deepseek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!(
            "openrouter".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenRouter
        );
        assert_eq!(
            "ollama".parse::<LLMProvider>().unwrap(),
            LLMProvider::Ollama
        );

        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(LLMProvider::DeepSeek.to_string(), "deepseek");
        assert_eq!(LLMProvider::OpenRouter.to_string(), "openrouter");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::OpenAI);
        // api_key may be empty if env var is not set
        assert!(!config.api_base_url.is_empty());
        assert!(!config.model_efficient.is_empty());
        assert!(!config.model_balanced.is_empty());
        assert!(!config.model_powerful.is_empty());
        assert_eq!(config.max_tokens, 16384);
    }

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::File);
        assert_eq!(config.cache_dir, PathBuf::from(".blogsmith/cache"));
        assert!(config.freshness().is_none());
    }

    #[test]
    fn test_cache_freshness_window() {
        let config = CacheConfig {
            freshness_hours: Some(48),
            ..Default::default()
        };
        assert_eq!(config.freshness(), Some(chrono::Duration::hours(48)));
    }

    #[test]
    fn test_cache_freshness_out_of_range_means_indefinite() {
        for hours in [u64::MAX, i64::MAX as u64, 10_000_000_000_000_000] {
            let config = CacheConfig {
                freshness_hours: Some(hours),
                ..Default::default()
            };
            assert_eq!(config.freshness(), None, "freshness_hours = {}", hours);
        }

        let config = CacheConfig {
            freshness_hours: Some(1_000_000_000),
            ..Default::default()
        };
        let window = config.freshness().unwrap();
        assert!(window > chrono::Duration::zero());
        assert_eq!(window, chrono::Duration::hours(1_000_000_000));
    }

    #[test]
    fn test_invoker_backoff_is_exponential_and_capped() {
        let config = InvokerConfig {
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 500,
            ..Default::default()
        };

        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(400));
        assert_eq!(config.backoff_for(4), Duration::from_millis(500));
        assert_eq!(config.backoff_for(10), Duration::from_millis(500));
    }

    #[test]
    fn test_config_from_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("blogsmith.toml");
        std::fs::write(
            &config_path,
            r#"
verbose = true

[llm]
provider = "anthropic"
model_balanced = "claude-balanced"

[invoker]
max_attempts = 5

[cache]
backend = "record_store"
freshness_hours = 720
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert!(config.verbose);
        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.model_balanced, "claude-balanced");
        assert_eq!(config.invoker.max_attempts, 5);
        assert_eq!(config.invoker.schema_retries, 1);
        assert_eq!(config.cache.backend, CacheBackend::RecordStore);
        assert_eq!(config.cache.freshness_hours, Some(720));
        assert_eq!(config.orchestrator.stage_retries, 1);
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file(&PathBuf::from("/nonexistent/blogsmith.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("blogsmith.toml");
        std::fs::write(&config_path, "this is = = not toml").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }
}
