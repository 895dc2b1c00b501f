#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use crate::i18n::TargetLanguage;
    use crate::types::{LinkDensity, ModelTier};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;
    use tempfile::TempDir;

    const REQUIRED: [&str; 5] = [
        "blogsmith",
        "--topic",
        "remote work productivity",
        "--reference",
        "https://example-blog.test",
    ];

    fn parse(extra: &[&str]) -> Args {
        let mut argv: Vec<&str> = REQUIRED.to_vec();
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_args_default_values() {
        let args = parse(&[]);

        assert_eq!(args.topic.as_deref(), Some("remote work productivity"));
        assert_eq!(args.ideas, None);
        assert_eq!(args.reference, "https://example-blog.test");
        assert_eq!(args.model_tier, "tier-2");
        assert!(args.keywords.is_empty());
        assert!(!args.force_refresh);
        assert!(!args.no_cache);
        assert!(!args.verbose);
        assert!(args.output_path.is_none());
    }

    #[test]
    fn test_args_require_topic_and_reference() {
        assert!(Args::try_parse_from(["blogsmith", "--topic", "x"]).is_err());
        assert!(Args::try_parse_from(["blogsmith", "--reference", "example.test"]).is_err());
    }

    #[test]
    fn test_args_repeatable_options() {
        let args = parse(&[
            "-k",
            "remote work",
            "--keyword",
            "async teams",
            "--avoid",
            "Remote work tips",
            "--avoid",
            "Working from home",
            "--product-url",
            "https://example-blog.test/pricing",
            "--high-performing-page",
            "https://example-blog.test/best-post",
        ]);

        assert_eq!(args.keywords, vec!["remote work", "async teams"]);
        assert_eq!(args.avoid.len(), 2);
        assert_eq!(args.product_urls.len(), 1);
        assert_eq!(args.high_performing_pages.len(), 1);
    }

    #[test]
    fn test_to_config_applies_overrides() {
        let args = parse(&[
            "--llm-provider",
            "anthropic",
            "--llm-api-key",
            "test-key",
            "--model-balanced",
            "claude-balanced",
            "--max-concurrent",
            "2",
            "--target-language",
            "de",
            "--output-path",
            "/tmp/blogsmith-out",
            "--no-cache",
            "--verbose",
        ]);
        let config = args.to_config().unwrap();

        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model_balanced, "claude-balanced");
        assert_eq!(config.rate_limit.max_concurrent, 2);
        assert_eq!(config.target_language, TargetLanguage::German);
        assert_eq!(config.output_path, PathBuf::from("/tmp/blogsmith-out"));
        assert!(!config.cache.enabled);
        assert!(config.verbose);
    }

    #[test]
    fn test_target_language_help_lists_supported_codes() {
        let command = Args::command();
        let help = command
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == "target_language")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();
        let codes = help
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(codes, _)| codes)
            .unwrap();

        for code in codes.split(',').map(str::trim) {
            assert!(
                code.parse::<TargetLanguage>().is_ok(),
                "`{}` is listed but not supported",
                code
            );
        }
        assert!(codes.contains("es"));
    }

    #[test]
    fn test_to_config_reads_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &config_path,
            "output_path = \"/srv/articles\"\n\n[orchestrator]\nstage_retries = 3\n",
        )
        .unwrap();

        let args = parse(&["--config", config_path.to_str().unwrap()]);
        let config = args.to_config().unwrap();
        assert_eq!(config.output_path, PathBuf::from("/srv/articles"));
        assert_eq!(config.orchestrator.stage_retries, 3);
    }

    #[test]
    fn test_to_config_fails_for_missing_explicit_file() {
        let args = parse(&["--config", "/nonexistent/blogsmith.toml"]);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_to_request() {
        let args = parse(&[
            "-m",
            "powerful",
            "--word-count",
            "1500",
            "--tone",
            "playful",
            "--link-density",
            "dense",
            "--force-refresh",
        ]);
        let mut config = crate::config::Config::default();
        config.target_language = TargetLanguage::French;

        let request = args.to_request(&config).unwrap();
        assert_eq!(request.topic(), "remote work productivity");
        assert_eq!(request.desired_model(), ModelTier::Tier3);
        let options = request.options();
        assert_eq!(options.word_count_target, Some(1500));
        assert_eq!(options.tone_override.as_deref(), Some("playful"));
        assert_eq!(options.link_density, LinkDensity::Dense);
        assert!(options.force_style_refresh);
        assert_eq!(options.target_language, TargetLanguage::French);
    }

    #[test]
    fn test_ideas_mode_does_not_need_topic() {
        let args = Args::try_parse_from([
            "blogsmith",
            "--reference",
            "example-blog.test",
            "--ideas",
            "8",
            "--preferences",
            "B2B SaaS founders",
            "-k",
            "remote teams",
            "--avoid",
            "Remote work tips",
            "-m",
            "tier-1",
        ])
        .unwrap();
        let mut config = crate::config::Config::default();
        config.target_language = TargetLanguage::Spanish;

        let request = args.to_ideation_request(&config).unwrap().unwrap();
        assert_eq!(request.reference_source, "example-blog.test");
        assert_eq!(request.num_topics, 8);
        assert_eq!(request.desired_model, ModelTier::Tier1);
        assert_eq!(request.preferences.as_deref(), Some("B2B SaaS founders"));
        assert_eq!(request.target_keywords, vec!["remote teams"]);
        assert_eq!(request.existing_topics_to_avoid, vec!["Remote work tips"]);
        assert_eq!(request.target_language, TargetLanguage::Spanish);

        assert!(args.to_request(&config).is_err());
        assert!(parse(&[]).to_ideation_request(&config).unwrap().is_none());
    }

    #[test]
    fn test_to_request_rejects_unknown_tier() {
        let args = parse(&["--model-tier", "tier-9"]);
        assert!(args.to_request(&crate::config::Config::default()).is_err());
    }
}
