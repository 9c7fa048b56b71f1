#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use crate::research::types::ResearchDepth;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["deepresearch-rs", "--topic", "solid state batteries"])
            .unwrap();

        assert_eq!(args.topic, "solid state batteries");
        assert_eq!(args.depth, None);
        assert_eq!(args.config, None);
        assert!(!args.verbose);
        assert!(!args.json);
        assert_eq!(args.llm_provider, None);
    }

    #[test]
    fn test_topic_is_required() {
        assert!(Args::try_parse_from(["deepresearch-rs"]).is_err());
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "-t",
            "rust async",
            "-d",
            "advanced",
            "-c",
            "/tmp/deepresearch.toml",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.topic, "rust async");
        assert_eq!(args.depth, Some(ResearchDepth::Advanced));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/deepresearch.toml")));
        assert!(args.verbose);
    }

    #[test]
    fn test_invalid_depth_is_rejected() {
        let result = Args::try_parse_from(["deepresearch-rs", "-t", "rust", "-d", "extreme"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_provider_is_rejected() {
        let result =
            Args::try_parse_from(["deepresearch-rs", "-t", "rust", "--llm-provider", "mistral"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_research_request() {
        let args = Args::try_parse_from(["deepresearch-rs", "-t", "rust", "--json"]).unwrap();
        let request = args.research_request();

        assert_eq!(request.topic, "rust");
        assert!(request.json_output);
    }

    #[test]
    fn test_into_config_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("deepresearch.toml");
        fs::write(
            &config_path,
            r#"
[llm]
provider = "deepseek"
model_efficient = "deepseek-chat"

[search]
tavily_api_key = "from-file"
timeout_seconds = 12

[research]
depth = "basic"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "deepresearch-rs",
            "-t",
            "rust",
            "-c",
            config_path.to_str().unwrap(),
            "--depth",
            "advanced",
            "--model-powerful",
            "deepseek-reasoner",
            "--exa-api-key",
            "exa-from-cli",
            "--temperature",
            "0.5",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model_efficient, "deepseek-chat");
        assert_eq!(config.llm.model_powerful, "deepseek-reasoner");
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.llm.resolved_base_url(), "https://api.deepseek.com");
        assert_eq!(config.llm.generation_params()["temperature"], 0.5);
        assert_eq!(config.search.tavily_api_key, "from-file");
        assert_eq!(config.search.exa_api_key, "exa-from-cli");
        assert_eq!(config.search.timeout_seconds, 12);
        assert_eq!(config.research.depth, ResearchDepth::Advanced);
    }

    #[test]
    fn test_into_config_with_missing_file_fails() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "-t",
            "rust",
            "-c",
            "/nonexistent/deepresearch.toml",
        ])
        .unwrap();

        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_into_config_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("deepresearch.toml");
        fs::write(&config_path, "verbose = false\n").unwrap();

        let args = Args::try_parse_from([
            "deepresearch-rs",
            "-t",
            "rust",
            "-c",
            config_path.to_str().unwrap(),
            "--search-timeout",
            "0",
        ])
        .unwrap();

        assert!(args.into_config().is_err());
    }
}
