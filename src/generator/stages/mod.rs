//! 流水线各阶段的输入、提示词模板与输出结构

use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n::TargetLanguage;
use crate::types::{
    ArticleBody, DuplicationVerdict, ResearchBundle, SeoReport, StyleAnalysisOutput,
    TopicIdeaList,
};

pub mod duplication_checker;
pub mod editor;
pub mod link_builder;
pub mod researcher;
pub mod seo_analyzer;
pub mod style_analyzer;
pub mod topic_ideator;
pub mod writer;

pub use duplication_checker::{DuplicationCandidate, DuplicationCheckInput};
pub use editor::EditingInput;
pub use link_builder::LinkingInput;
pub use researcher::ResearchInput;
pub use seo_analyzer::SeoAnalysisInput;
pub use style_analyzer::StyleAnalysisInput;
pub use topic_ideator::TopicIdeationInput;
pub use writer::WritingInput;

/// 阶段类型
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    StyleAnalysis,
    DuplicationCheck,
    Research,
    Writing,
    Linking,
    Editing,
    SeoAnalysis,
    /// 独立于文章流水线的选题生成
    TopicIdeation,
}

impl StageKind {
    /// 文章流水线按执行顺序排列的阶段
    pub const ALL: [StageKind; 7] = [
        StageKind::StyleAnalysis,
        StageKind::DuplicationCheck,
        StageKind::Research,
        StageKind::Writing,
        StageKind::Linking,
        StageKind::Editing,
        StageKind::SeoAnalysis,
    ];

    /// 该阶段期望输出的JSON Schema
    pub fn output_schema(&self) -> Value {
        let schema = match self {
            StageKind::StyleAnalysis => schemars::schema_for!(StyleAnalysisOutput),
            StageKind::DuplicationCheck => schemars::schema_for!(DuplicationVerdict),
            StageKind::Research => schemars::schema_for!(ResearchBundle),
            StageKind::Writing | StageKind::Linking | StageKind::Editing => {
                schemars::schema_for!(ArticleBody)
            }
            StageKind::SeoAnalysis => schemars::schema_for!(SeoReport),
            StageKind::TopicIdeation => schemars::schema_for!(TopicIdeaList),
        };
        serde_json::to_value(schema).unwrap_or_default()
    }
}

impl Display for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::StyleAnalysis => write!(f, "style_analysis"),
            StageKind::DuplicationCheck => write!(f, "duplication_check"),
            StageKind::Research => write!(f, "research"),
            StageKind::Writing => write!(f, "writing"),
            StageKind::Linking => write!(f, "linking"),
            StageKind::Editing => write!(f, "editing"),
            StageKind::SeoAnalysis => write!(f, "seo_analysis"),
            StageKind::TopicIdeation => write!(f, "topic_ideation"),
        }
    }
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

/// 用户提示词中的一段材料
pub struct PromptSection {
    pub title: &'static str,
    pub body: String,
}

impl PromptSection {
    pub fn new(title: &'static str, body: impl Into<String>) -> Self {
        Self {
            title,
            body: body.into(),
        }
    }
}

/// 单个阶段的提示词来源
pub trait StagePrompt {
    fn kind(&self) -> StageKind;

    fn prompt_template(&self) -> PromptTemplate;

    /// 插入到开头与结尾指令之间的材料
    fn sections(&self) -> Vec<PromptSection>;

    /// 面向读者输出正文的阶段需要遵循文章语言
    fn target_language(&self) -> Option<TargetLanguage> {
        None
    }
}

/// 阶段输入，每个阶段一个变体，只携带该阶段需要的数据
#[derive(Debug, Clone)]
pub enum StageInput {
    StyleAnalysis(StyleAnalysisInput),
    DuplicationCheck(DuplicationCheckInput),
    Research(ResearchInput),
    Writing(WritingInput),
    Linking(LinkingInput),
    Editing(EditingInput),
    SeoAnalysis(SeoAnalysisInput),
    TopicIdeation(TopicIdeationInput),
}

impl StageInput {
    fn as_prompt(&self) -> &dyn StagePrompt {
        match self {
            StageInput::StyleAnalysis(input) => input,
            StageInput::DuplicationCheck(input) => input,
            StageInput::Research(input) => input,
            StageInput::Writing(input) => input,
            StageInput::Linking(input) => input,
            StageInput::Editing(input) => input,
            StageInput::SeoAnalysis(input) => input,
            StageInput::TopicIdeation(input) => input,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.as_prompt().kind()
    }

    pub fn system_prompt(&self) -> String {
        let prompt = self.as_prompt();
        let template = prompt.prompt_template();
        match prompt.target_language() {
            Some(language) => format!(
                "{}\n\n{}",
                template.system_prompt,
                language.prompt_instruction()
            ),
            None => template.system_prompt,
        }
    }

    pub fn user_prompt(&self) -> String {
        let prompt = self.as_prompt();
        let template = prompt.prompt_template();

        let mut content = String::new();
        content.push_str(&template.opening_instruction);
        content.push_str("\n\n");

        for section in prompt.sections() {
            if section.body.trim().is_empty() {
                continue;
            }
            content.push_str(&format!("## {}\n{}\n\n", section.title, section.body.trim()));
        }

        content.push_str(&template.closing_instruction);
        content
    }
}

/// 阶段输出结构的语义校验
pub trait StageSchema: JsonSchema + DeserializeOwned {
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// 阶段输出，每个阶段一个变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "payload", rename_all = "snake_case")]
pub enum StagePayload {
    StyleAnalysis(StyleAnalysisOutput),
    DuplicationCheck(DuplicationVerdict),
    Research(ResearchBundle),
    Writing(ArticleBody),
    Linking(ArticleBody),
    Editing(ArticleBody),
    SeoAnalysis(SeoReport),
    TopicIdeation(TopicIdeaList),
}

fn parse<T: StageSchema>(value: Value) -> Result<T, String> {
    let parsed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
    parsed.check()?;
    Ok(parsed)
}

impl StagePayload {
    /// 按阶段类型校验并转换推理服务返回的JSON
    pub fn validate(kind: StageKind, value: Value) -> Result<StagePayload, String> {
        match kind {
            StageKind::StyleAnalysis => parse(value).map(StagePayload::StyleAnalysis),
            StageKind::DuplicationCheck => parse(value).map(StagePayload::DuplicationCheck),
            StageKind::Research => parse(value).map(StagePayload::Research),
            StageKind::Writing => parse(value).map(StagePayload::Writing),
            StageKind::Linking => parse(value).map(StagePayload::Linking),
            StageKind::Editing => parse(value).map(StagePayload::Editing),
            StageKind::SeoAnalysis => parse(value).map(StagePayload::SeoAnalysis),
            StageKind::TopicIdeation => parse(value).map(StagePayload::TopicIdeation),
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StagePayload::StyleAnalysis(_) => StageKind::StyleAnalysis,
            StagePayload::DuplicationCheck(_) => StageKind::DuplicationCheck,
            StagePayload::Research(_) => StageKind::Research,
            StagePayload::Writing(_) => StageKind::Writing,
            StagePayload::Linking(_) => StageKind::Linking,
            StagePayload::Editing(_) => StageKind::Editing,
            StagePayload::SeoAnalysis(_) => StageKind::SeoAnalysis,
            StagePayload::TopicIdeation(_) => StageKind::TopicIdeation,
        }
    }
}

/// 把列表渲染为markdown项目符号
pub(crate) fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .filter(|item| !item.trim().is_empty())
        .map(|item| format!("- {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
