use crate::config::LLMConfig;

/// 超过该长度（字节）的prompt直接交给高质量模型
const EFFICIENT_PROMPT_LIMIT: usize = 32 * 1024;

/// 根据prompt长度选择模型，返回（首选模型，兜底模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_PROMPT_LIMIT {
        let fallover = (llm_config.model_powerful != llm_config.model_efficient)
            .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prompt_uses_efficient_model_with_fallover() {
        let config = LLMConfig::default();
        let (model, fallover) = evaluate_befitting_model(&config, "system", "user");

        assert_eq!(model, config.model_efficient);
        assert_eq!(fallover, Some(config.model_powerful.clone()));
    }

    #[test]
    fn test_long_prompt_uses_powerful_model() {
        let config = LLMConfig::default();
        let long_prompt = "x".repeat(EFFICIENT_PROMPT_LIMIT + 1);
        let (model, fallover) = evaluate_befitting_model(&config, "", &long_prompt);

        assert_eq!(model, config.model_powerful);
        assert_eq!(fallover, None);
    }

    #[test]
    fn test_same_models_have_no_fallover() {
        let config = LLMConfig {
            model_powerful: "same".to_string(),
            model_efficient: "same".to_string(),
            ..Default::default()
        };
        let (_, fallover) = evaluate_befitting_model(&config, "s", "u");
        assert_eq!(fallover, None);
    }
}
