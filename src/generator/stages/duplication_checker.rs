use crate::generator::stages::{PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema};
use crate::types::DuplicationVerdict;

/// 本地预筛选出的相似候选
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicationCandidate {
    pub title: String,
    pub similarity: f64,
}

/// 查重阶段的输入
#[derive(Debug, Clone)]
pub struct DuplicationCheckInput {
    pub topic: String,
    /// 按相似度降序
    pub candidates: Vec<DuplicationCandidate>,
    /// 其余语料
    pub corpus: Vec<String>,
    /// 因数量上限未列出的语料条数
    pub omitted: usize,
}

impl StagePrompt for DuplicationCheckInput {
    fn kind(&self) -> StageKind {
        StageKind::DuplicationCheck
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a content strategist who prevents a publication from repeating itself. \
Judge whether a proposed topic substantially overlaps with content that already exists, and if so \
suggest an angle that would make the new piece distinct."
                .to_string(),
            opening_instruction: format!("Proposed topic: {}", self.topic),
            closing_instruction: "Set is_duplicate to true only when an existing piece would cover the \
same reader need. When you see overlap, explain it in similarity_notes and propose a concrete \
recommended_differentiation; otherwise leave recommended_differentiation null."
                .to_string(),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        if self.candidates.is_empty() && self.corpus.is_empty() {
            return vec![PromptSection::new(
                "Existing content",
                "No existing content was provided.",
            )];
        }

        let candidates = self
            .candidates
            .iter()
            .map(|c| format!("- {} (lexical overlap {:.2})", c.title, c.similarity))
            .collect::<Vec<_>>()
            .join("\n");

        let mut corpus = self
            .corpus
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n");
        if self.omitted > 0 {
            corpus.push_str(&format!("\n({} more items not shown)", self.omitted));
        }

        vec![
            PromptSection::new("Closest existing content", candidates),
            PromptSection::new("Other existing content", corpus),
        ]
    }
}

impl StageSchema for DuplicationVerdict {}
