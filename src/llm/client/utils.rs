use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::config::LLMConfig;
use crate::llm::capability::CapabilityError;
use crate::types::ModelTier;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("code fence pattern is valid")
});
static RETRY_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry[- ]after[^0-9]{0,8}(\d+)").expect("retry-after pattern is valid")
});
static RATE_LIMIT_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b429\b").expect("rate limit status pattern is valid"));
static CLIENT_ERROR_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:400|401|403|404|413|422)\b").expect("client error status pattern is valid")
});

/// 响应体解码失败的常见措辞（serde_json与provider SDK）
const DECODE_MARKERS: &[&str] = &[
    "invalid type",
    "invalid value",
    "missing field",
    "unknown variant",
    "expected value",
    "eof while parsing",
    "trailing characters",
    "failed to decode",
    "error decoding",
    "deserializ",
    "json",
];

/// 按能力档位选择模型
pub fn model_for_tier(llm_config: &LLMConfig, tier: ModelTier) -> &str {
    match tier {
        ModelTier::Tier1 => &llm_config.model_efficient,
        ModelTier::Tier2 => &llm_config.model_balanced,
        ModelTier::Tier3 => &llm_config.model_powerful,
    }
}

/// 从模型回复中提取JSON：优先取代码块，否则取最外层的花括号
pub fn extract_json(raw: &str) -> Result<Value, CapabilityError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(captures) = CODE_FENCE.captures(trimmed) {
        if let Some(inner) = captures.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(inner.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&trimmed[start..=end])
                .map_err(|e| CapabilityError::MalformedOutput(e.to_string()))
        }
        _ => Err(CapabilityError::MalformedOutput(
            "response contains no JSON object".to_string(),
        )),
    }
}

/// 把provider的错误文本归类为失败信号
pub fn classify_provider_error(message: &str) -> CapabilityError {
    let lower = message.to_lowercase();
    let client_error = CLIENT_ERROR_STATUS.is_match(&lower);

    if RATE_LIMIT_STATUS.is_match(&lower)
        || lower.contains("rate limit")
        || lower.contains("too many requests")
    {
        let retry_after = RETRY_AFTER
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(Duration::from_secs);
        return CapabilityError::RateLimited { retry_after };
    }
    if lower.contains("timed out") || lower.contains("timeout") {
        return CapabilityError::Timeout;
    }
    if lower.contains("content policy")
        || lower.contains("content_policy")
        || lower.contains("content management policy")
        || lower.contains("safety")
    {
        return CapabilityError::PolicyRejected(message.to_string());
    }
    if !client_error && DECODE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return CapabilityError::MalformedOutput(message.to_string());
    }
    if lower.contains("connection") || lower.contains("dns") || lower.contains("connect") {
        return CapabilityError::Network(message.to_string());
    }
    if client_error
        || lower.contains("invalid")
        || lower.contains("context length")
        || lower.contains("unauthorized")
    {
        return CapabilityError::InvalidInput(message.to_string());
    }
    CapabilityError::Network(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_for_tier() {
        let config = LLMConfig::default();
        assert_eq!(model_for_tier(&config, ModelTier::Tier1), config.model_efficient);
        assert_eq!(model_for_tier(&config, ModelTier::Tier2), config.model_balanced);
        assert_eq!(model_for_tier(&config, ModelTier::Tier3), config.model_powerful);
    }

    #[test]
    fn test_extract_json_variants() {
        let plain = extract_json(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(plain["content"], "hi");

        let fenced = extract_json("Here you go:\n```json\n{\"score\": 80}\n```\nThanks").unwrap();
        assert_eq!(fenced["score"], 80);

        let embedded = extract_json("Sure! {\"a\": {\"b\": 1}} done").unwrap();
        assert_eq!(embedded["a"]["b"], 1);

        assert!(matches!(
            extract_json("no json here"),
            Err(CapabilityError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_classify_provider_error() {
        assert_eq!(
            classify_provider_error("HTTP 429 Too Many Requests, retry-after: 7"),
            CapabilityError::RateLimited {
                retry_after: Some(Duration::from_secs(7))
            }
        );
        assert_eq!(
            classify_provider_error("request timed out"),
            CapabilityError::Timeout
        );
        assert!(matches!(
            classify_provider_error("400 Bad Request: invalid model"),
            CapabilityError::InvalidInput(_)
        ));
        assert!(matches!(
            classify_provider_error("blocked by content policy"),
            CapabilityError::PolicyRejected(_)
        ));
        assert!(matches!(
            classify_provider_error("error sending request: connection refused"),
            CapabilityError::Network(_)
        ));
        assert!(matches!(
            classify_provider_error("something odd"),
            CapabilityError::Network(_)
        ));
    }

    #[test]
    fn test_classify_decode_errors_as_malformed_output() {
        for message in [
            "ResponseError: invalid type: null, expected a string at line 1 column 42",
            "missing field `choices` at line 1 column 120",
            "error decoding response body",
            "JsonError: EOF while parsing an object",
        ] {
            assert!(
                matches!(
                    classify_provider_error(message),
                    CapabilityError::MalformedOutput(_)
                ),
                "{}",
                message
            );
        }
        assert!(matches!(
            classify_provider_error("400 Bad Request: invalid JSON body"),
            CapabilityError::InvalidInput(_)
        ));
        assert!(matches!(
            classify_provider_error("401 Unauthorized"),
            CapabilityError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_classify_matches_status_codes_as_whole_words() {
        assert!(matches!(
            classify_provider_error("provider error: prompt used 14290 tokens"),
            CapabilityError::Network(_)
        ));
        assert!(matches!(
            classify_provider_error("request id req_4001 failed upstream"),
            CapabilityError::Network(_)
        ));
        assert!(matches!(
            classify_provider_error("status 429"),
            CapabilityError::RateLimited { retry_after: None }
        ));
    }
}
