use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::request::SourceIdentity;

/// 风格分析质量
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisQuality {
    High,
    Medium,
    Low,
}

impl Display for AnalysisQuality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisQuality::High => write!(f, "high"),
            AnalysisQuality::Medium => write!(f, "medium"),
            AnalysisQuality::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for AnalysisQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(AnalysisQuality::High),
            "medium" => Ok(AnalysisQuality::Medium),
            "low" => Ok(AnalysisQuality::Low),
            _ => Err(format!("Unknown analysis quality: {}", s)),
        }
    }
}

/// 风格分析Agent的结构化输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct StyleAnalysisOutput {
    /// 语气与人格特征
    pub tone: String,
    /// 标题层级与标题写法
    pub heading_style: String,
    /// 列表使用习惯（项目符号/编号）
    pub list_style: String,
    /// 可直接交给写手的完整风格指南
    pub guide_text: String,
    /// 分析质量自评：样本充分为high，样本稀少为low
    pub analysis_quality: AnalysisQuality,
}

/// 参考来源的风格画像，由风格缓存持有
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleProfile {
    pub source_identity: SourceIdentity,
    pub tone: String,
    pub heading_style: String,
    pub list_style: String,
    pub guide_text: String,
    pub analysis_quality: AnalysisQuality,
    pub last_updated: DateTime<Utc>,
}

impl StyleProfile {
    pub fn from_analysis(
        source_identity: SourceIdentity,
        analysis: StyleAnalysisOutput,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_identity,
            tone: analysis.tone,
            heading_style: analysis.heading_style,
            list_style: analysis.list_style,
            guide_text: analysis.guide_text,
            analysis_quality: analysis.analysis_quality,
            last_updated: analyzed_at,
        }
    }

    /// 缓存中的画像是否可以直接复用
    ///
    /// 低质量画像永远需要重新分析；`freshness`为`None`时画像不过期。
    pub fn is_reusable(&self, now: DateTime<Utc>, freshness: Option<Duration>) -> bool {
        if self.analysis_quality == AnalysisQuality::Low {
            return false;
        }
        match freshness {
            Some(window) => now.signed_duration_since(self.last_updated) <= window,
            None => true,
        }
    }

    /// 应用请求级的语气覆盖，返回仅供本次请求使用的副本
    pub fn with_tone_override(&self, tone: Option<&str>) -> Self {
        match tone {
            Some(tone) if !tone.trim().is_empty() => Self {
                tone: tone.trim().to_string(),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(quality: AnalysisQuality, age_hours: i64) -> (StyleProfile, DateTime<Utc>) {
        let now = Utc::now();
        let profile = StyleProfile {
            source_identity: SourceIdentity::parse("example-blog.test").unwrap(),
            tone: "conversational".to_string(),
            heading_style: "question-style H2".to_string(),
            list_style: "short bullets".to_string(),
            guide_text: "Write like a friend explaining over coffee.".to_string(),
            analysis_quality: quality,
            last_updated: now - Duration::hours(age_hours),
        };
        (profile, now)
    }

    #[test]
    fn test_profile_valid_indefinitely_without_window() {
        let (p, now) = profile(AnalysisQuality::High, 24 * 365 * 3);
        assert!(p.is_reusable(now, None));
    }

    #[test]
    fn test_low_quality_is_never_reusable() {
        let (p, now) = profile(AnalysisQuality::Low, 0);
        assert!(!p.is_reusable(now, None));
        assert!(!p.is_reusable(now, Some(Duration::hours(1))));
    }

    #[test]
    fn test_freshness_window_expires_profile() {
        let (p, now) = profile(AnalysisQuality::Medium, 48);
        assert!(!p.is_reusable(now, Some(Duration::hours(24))));
        assert!(p.is_reusable(now, Some(Duration::hours(72))));
    }

    #[test]
    fn test_tone_override_does_not_touch_original() {
        let (p, _) = profile(AnalysisQuality::High, 0);
        let overridden = p.with_tone_override(Some("  formal  "));
        assert_eq!(overridden.tone, "formal");
        assert_eq!(p.tone, "conversational");
        assert_eq!(p.with_tone_override(Some(" ")).tone, "conversational");
    }
}
