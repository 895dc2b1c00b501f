//! 查重门：建议性质，结论只作为数据传给后续阶段

use std::collections::BTreeSet;

use crate::config::DuplicationConfig;
use crate::generator::invoker::{AgentInvoker, StageOutput};
use crate::generator::stages::{DuplicationCandidate, DuplicationCheckInput, StageInput};
use crate::types::ModelTier;
use crate::utils::text::jaccard_similarity;

pub struct DuplicationGate {
    invoker: AgentInvoker,
    config: DuplicationConfig,
}

impl DuplicationGate {
    pub fn new(invoker: AgentInvoker, config: DuplicationConfig) -> Self {
        Self { invoker, config }
    }

    /// 判断主题是否与已有内容重复，只调用一次推理
    pub async fn check(
        &self,
        topic: &str,
        corpus: Option<&[String]>,
        tier: ModelTier,
    ) -> StageOutput {
        let input = self.build_input(topic, corpus.unwrap_or_default());
        tracing::debug!(
            "🔍 查重候选 {} 条，其余语料 {} 条",
            input.candidates.len(),
            input.corpus.len()
        );
        self.invoker
            .invoke(&StageInput::DuplicationCheck(input), tier)
            .await
    }

    /// 本地按词集合相似度排序，挑出重点候选
    pub fn build_input(&self, topic: &str, corpus: &[String]) -> DuplicationCheckInput {
        let mut seen = BTreeSet::new();
        let mut scored: Vec<(String, f64)> = corpus
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .filter(|item| seen.insert(item.to_lowercase()))
            .map(|item| (item.to_string(), jaccard_similarity(topic, item)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut candidates = Vec::new();
        let mut rest = Vec::new();
        for (title, similarity) in scored {
            if similarity >= self.config.min_similarity
                && candidates.len() < self.config.max_candidates
            {
                candidates.push(DuplicationCandidate { title, similarity });
            } else {
                rest.push(title);
            }
        }

        let omitted = rest.len().saturating_sub(self.config.max_corpus_items);
        rest.truncate(self.config.max_corpus_items);

        DuplicationCheckInput {
            topic: topic.to_string(),
            candidates,
            corpus: rest,
            omitted,
        }
    }
}
