use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnalysisQuality, SourceError, SourceIdentity, StyleProfile};

/// Style_Guides 表的一行
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleGuideRecord {
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "Last_Updated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "Tone")]
    pub tone: String,
    #[serde(rename = "Heading_Style")]
    pub heading_style: String,
    #[serde(rename = "List_Style")]
    pub list_style: String,
    #[serde(rename = "Style_Guide_Text")]
    pub style_guide_text: String,
    #[serde(rename = "Analysis_Quality")]
    pub analysis_quality: AnalysisQuality,
}

impl From<&StyleProfile> for StyleGuideRecord {
    fn from(profile: &StyleProfile) -> Self {
        Self {
            domain: profile.source_identity.domain().to_string(),
            last_updated: profile.last_updated,
            tone: profile.tone.clone(),
            heading_style: profile.heading_style.clone(),
            list_style: profile.list_style.clone(),
            style_guide_text: profile.guide_text.clone(),
            analysis_quality: profile.analysis_quality,
        }
    }
}

impl TryFrom<StyleGuideRecord> for StyleProfile {
    type Error = SourceError;

    fn try_from(record: StyleGuideRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            source_identity: SourceIdentity::from_domain(&record.domain)?,
            tone: record.tone,
            heading_style: record.heading_style,
            list_style: record.list_style,
            guide_text: record.style_guide_text,
            analysis_quality: record.analysis_quality,
            last_updated: record.last_updated,
        })
    }
}

/// 生成记录的状态
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Completed,
    Failed,
    Cancelled,
}

impl Display for ContentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentStatus::Completed => write!(f, "completed"),
            ContentStatus::Failed => write!(f, "failed"),
            ContentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Generated_Content 表的一行（只追加）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedContentRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Source_Blog")]
    pub source_blog: String,
    #[serde(rename = "Date_Created")]
    pub date_created: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: ContentStatus,
    #[serde(rename = "Final_Content")]
    pub final_content: String,
    #[serde(rename = "SEO_Score")]
    pub seo_score: Option<f64>,
    #[serde(rename = "Word_Count")]
    pub word_count: Option<u32>,
    #[serde(rename = "User_Notes")]
    pub user_notes: String,
}

/// Blog_Sources 表的一行
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlogSourceRecord {
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Quality_Rating")]
    pub quality_rating: Option<AnalysisQuality>,
    #[serde(rename = "Last_Analyzed")]
    pub last_analyzed: Option<DateTime<Utc>>,
    #[serde(rename = "Success_Count")]
    pub success_count: u32,
    #[serde(rename = "Notes")]
    pub notes: String,
}

impl BlogSourceRecord {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            category: String::new(),
            quality_rating: None,
            last_analyzed: None,
            success_count: 0,
            notes: String::new(),
        }
    }
}
