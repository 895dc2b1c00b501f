use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 选题建议的内容形式
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Guide,
    Tutorial,
    Listicle,
    CaseStudy,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Guide => write!(f, "Guide"),
            ContentType::Tutorial => write!(f, "Tutorial"),
            ContentType::Listicle => write!(f, "Listicle"),
            ContentType::CaseStudy => write!(f, "Case Study"),
        }
    }
}

/// 单条选题建议
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct TopicIdea {
    /// 可以直接作为文章标题的选题
    pub title: String,
    /// 一句话说明独特切入角度
    pub angle: String,
    /// 选题围绕的关键词
    pub keywords: Vec<String>,
    /// 一句话说明这个选题为什么适合该站点
    pub rationale: String,
    pub content_type: ContentType,
}

/// 选题Agent的结构化输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct TopicIdeaList {
    pub ideas: Vec<TopicIdea>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_wire_names() {
        let parsed: ContentType = serde_json::from_str("\"case_study\"").unwrap();
        assert_eq!(parsed, ContentType::CaseStudy);
        assert_eq!(parsed.to_string(), "Case Study");
        assert!(serde_json::from_str::<ContentType>("\"podcast\"").is_err());
    }
}
