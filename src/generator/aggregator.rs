//! 把最终的流水线状态组装为交付结果

use serde::{Deserialize, Serialize};

use crate::generator::invoker::FailureKind;
use crate::generator::stages::StageKind;
use crate::generator::state::{PipelinePhase, PipelineState};
use crate::types::{
    ContentSnapshot, DuplicationVerdict, RequestId, ResearchBundle, SeoReport, SourceIdentity,
    StyleProfile,
};

/// 完成状态
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed {
        stage: StageKind,
        kind: FailureKind,
        detail: String,
    },
    Cancelled {
        at: PipelinePhase,
    },
}

impl CompletionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionStatus::Completed)
    }
}

/// 交付给调用方与持久化层的结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResultBundle {
    pub request_id: RequestId,
    pub topic: String,
    pub source_identity: Option<SourceIdentity>,
    /// 只有编辑阶段完成后才有最终正文
    pub final_content: Option<String>,
    /// 正文链上最新的快照，失败时用于展示部分结果
    pub latest_snapshot: Option<ContentSnapshot>,
    pub style_profile: Option<StyleProfile>,
    pub research_bundle: Option<ResearchBundle>,
    pub seo_report: Option<SeoReport>,
    pub duplication_verdict: Option<DuplicationVerdict>,
    pub completion_status: CompletionStatus,
    pub stages_completed: Vec<StageKind>,
    pub style_cache_hit: bool,
}

pub struct ResultAggregator;

impl ResultAggregator {
    /// 纯函数：同一状态总是得到同一结果
    pub fn assemble(state: &PipelineState) -> ResultBundle {
        let completion_status = match (state.phase(), state.failure()) {
            (PipelinePhase::Completed, _) => CompletionStatus::Completed,
            (PipelinePhase::Failed, Some(failure)) => CompletionStatus::Failed {
                stage: failure.stage,
                kind: failure.kind,
                detail: failure.detail.clone(),
            },
            (PipelinePhase::Cancelled, _) => CompletionStatus::Cancelled {
                at: state.cancelled_at().unwrap_or(PipelinePhase::Received),
            },
            // 未到终态的状态按在当前阶段中止处理
            (phase, _) => CompletionStatus::Cancelled { at: phase },
        };

        ResultBundle {
            request_id: state.request().id(),
            topic: state.request().topic().to_string(),
            source_identity: state.source().cloned(),
            final_content: state.edited().map(|edited| edited.body().to_string()),
            latest_snapshot: state.latest_snapshot(),
            style_profile: state.style_profile().cloned(),
            research_bundle: state.research().cloned(),
            seo_report: state.seo_report().cloned(),
            duplication_verdict: state.duplication().cloned(),
            completion_status,
            stages_completed: state.stages_completed(),
            style_cache_hit: state.style_from_cache(),
        }
    }
}

impl ResultBundle {
    /// 渲染为便于阅读的markdown报告
    pub fn to_markdown(&self) -> String {
        let mut content = String::new();

        match (&self.final_content, &self.latest_snapshot) {
            (Some(final_content), _) => {
                content.push_str(final_content.trim());
                content.push_str("\n\n");
            }
            (None, Some(snapshot)) => {
                content.push_str("> Partial result: the pipeline stopped before editing finished.\n\n");
                content.push_str(snapshot.body().trim());
                content.push_str("\n\n");
            }
            (None, None) => {
                content.push_str(&format!("# {}\n\n", self.topic));
                content.push_str("> No article content was produced.\n\n");
            }
        }

        content.push_str("---\n\n## Generation report\n\n");
        let status = match &self.completion_status {
            CompletionStatus::Completed => "completed".to_string(),
            CompletionStatus::Failed {
                stage,
                kind,
                detail,
            } => format!("failed at {} ({}): {}", stage, kind, detail),
            CompletionStatus::Cancelled { at } => format!("cancelled at {}", at),
        };
        content.push_str(&format!("- Status: {}\n", status));
        if let Some(source) = &self.source_identity {
            content.push_str(&format!(
                "- Reference: {}{}\n",
                source,
                if self.style_cache_hit {
                    " (cached style guide)"
                } else {
                    ""
                }
            ));
        }

        if let Some(report) = &self.seo_report {
            content.push_str(&format!(
                "\n### SEO\n\n- Score: {:.1}\n- Word count: {}\n",
                report.score, report.word_count
            ));
            for recommendation in &report.recommendations {
                content.push_str(&format!("- {}\n", recommendation));
            }
        }

        if let Some(verdict) = &self.duplication_verdict {
            content.push_str(&format!(
                "\n### Duplication check\n\n- Duplicate: {}\n- Notes: {}\n",
                if verdict.is_duplicate { "yes" } else { "no" },
                verdict.similarity_notes
            ));
            if let Some(hint) = &verdict.recommended_differentiation {
                content.push_str(&format!("- Differentiation: {}\n", hint));
            }
        }

        if let Some(research) = &self.research_bundle {
            if !research.citations.is_empty() {
                content.push_str("\n### Sources\n\n");
                for citation in &research.citations {
                    content.push_str(&format!("- {}\n", citation));
                }
            }
        }

        if let Some(style) = &self.style_profile {
            content.push_str(&format!(
                "\n### Style guide ({})\n\n{}\n",
                style.analysis_quality, style.guide_text
            ));
        }

        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelTier, PipelineRequest, RequestOptions, SourcedClaim};

    fn failed_state() -> PipelineState {
        let mut state = PipelineState::new(PipelineRequest::new(
            "remote work productivity",
            "https://example-blog.test",
            ModelTier::Tier2,
            RequestOptions::default(),
        ));
        state.commit_source(SourceIdentity::parse("https://example-blog.test").unwrap());
        state.commit_duplication(DuplicationVerdict {
            is_duplicate: false,
            similarity_notes: "no overlap".to_string(),
            recommended_differentiation: None,
        });
        state.commit_research(ResearchBundle {
            facts: vec![SourcedClaim {
                claim: "claim".to_string(),
                source: None,
            }],
            citations: ["https://survey.test".to_string()].into_iter().collect(),
        });
        state.commit_draft("# Draft".to_string());
        state.fail(
            StageKind::Linking,
            FailureKind::PolicyRejected,
            "refused".to_string(),
        );
        state
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let state = failed_state();
        assert_eq!(
            ResultAggregator::assemble(&state),
            ResultAggregator::assemble(&state)
        );
    }

    #[test]
    fn test_partial_result_keeps_outputs_without_final_content() {
        let bundle = ResultAggregator::assemble(&failed_state());

        assert!(bundle.final_content.is_none());
        assert_eq!(bundle.latest_snapshot.as_ref().unwrap().body(), "# Draft");
        assert!(bundle.research_bundle.is_some());
        assert!(bundle.duplication_verdict.is_some());
        assert_eq!(
            bundle.completion_status,
            CompletionStatus::Failed {
                stage: StageKind::Linking,
                kind: FailureKind::PolicyRejected,
                detail: "refused".to_string(),
            }
        );
        assert_eq!(
            bundle.stages_completed,
            vec![
                StageKind::DuplicationCheck,
                StageKind::Research,
                StageKind::Writing
            ]
        );

        let markdown = bundle.to_markdown();
        assert!(markdown.contains("Partial result"));
        assert!(markdown.contains("failed at linking (policy_rejected): refused"));
        assert!(markdown.contains("- https://survey.test"));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(CompletionStatus::Cancelled {
            at: PipelinePhase::Writing,
        })
        .unwrap();
        assert_eq!(json["status"], "cancelled");
        assert_eq!(json["at"], "Writing");
    }
}
